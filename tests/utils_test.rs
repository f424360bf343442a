use base64::{Engine, engine::general_purpose::URL_SAFE_NO_PAD};
use spotify_chat_relay::snapshot::{artist_ids, compact_recent, compact_tracks, enrich_tracks};
use spotify_chat_relay::types::{
    AlbumRef, Artist, ArtistRef, PlayHistory, TimeRange, Token, Track,
};
use spotify_chat_relay::utils::*;

const SECRET: &[u8] = b"test-secret";
const NOW: u64 = 1_700_000_000;

// Helper function to create a test track
fn create_test_track(name: &str, artists: &[(&str, &str)]) -> Track {
    Track {
        id: Some(format!("{}_id", name)),
        name: name.to_string(),
        popularity: Some(50),
        duration_ms: Some(180_000),
        album: AlbumRef {
            name: format!("{} album", name),
            release_date: Some("2023-10-17".to_string()),
        },
        artists: artists
            .iter()
            .map(|(id, name)| ArtistRef {
                id: Some(id.to_string()),
                name: name.to_string(),
            })
            .collect(),
    }
}

// Helper function to create a test artist
fn create_test_artist(id: &str, name: &str, genres: &[&str]) -> Artist {
    Artist {
        id: id.to_string(),
        name: name.to_string(),
        genres: genres.iter().map(|g| g.to_string()).collect(),
        popularity: Some(70),
    }
}

#[test]
fn test_generate_nonce() {
    let nonce = generate_nonce();

    // Should be exactly 32 characters
    assert_eq!(nonce.len(), 32);

    // Should contain only alphanumeric characters
    assert!(nonce.chars().all(|c| c.is_ascii_alphanumeric()));

    // Two generated nonces should be different
    assert_ne!(nonce, generate_nonce());
}

#[test]
fn test_signed_state_verifies() {
    let state = sign_state(SECRET, NOW).unwrap();

    // Should be URL-safe so it survives the round trip through the browser
    assert!(
        state
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-' || c == '.')
    );

    assert_eq!(verify_state(SECRET, &state, NOW + 10, 600), Ok(()));

    // Every login gets its own state
    assert_ne!(state, sign_state(SECRET, NOW).unwrap());
}

#[test]
fn test_state_signed_with_other_secret_is_rejected() {
    let state = sign_state(b"another-secret", NOW).unwrap();
    assert_eq!(
        verify_state(SECRET, &state, NOW, 600),
        Err(StateError::BadSignature)
    );
}

#[test]
fn test_tampered_state_is_rejected() {
    let state = sign_state(SECRET, NOW).unwrap();
    let (_, tag) = state.split_once('.').unwrap();

    // Move the timestamp forward but keep the original signature
    let forged_payload = URL_SAFE_NO_PAD.encode(format!("nonce:{}", NOW + 5000));
    let forged = format!("{}.{}", forged_payload, tag);

    assert_eq!(
        verify_state(SECRET, &forged, NOW + 5000, 600),
        Err(StateError::BadSignature)
    );
}

#[test]
fn test_state_expiry_and_clock_skew() {
    let state = sign_state(SECRET, NOW).unwrap();

    // Exactly at max age is still fine, one second later is not
    assert_eq!(verify_state(SECRET, &state, NOW + 600, 600), Ok(()));
    assert_eq!(
        verify_state(SECRET, &state, NOW + 601, 600),
        Err(StateError::Expired)
    );

    // Small skew tolerated, large skew rejected
    assert_eq!(verify_state(SECRET, &state, NOW - 30, 600), Ok(()));
    assert_eq!(
        verify_state(SECRET, &state, NOW - 3600, 600),
        Err(StateError::FromFuture)
    );
}

#[test]
fn test_malformed_state_is_rejected() {
    for state in ["", "no-dot-here", "!!!.???", "abc."] {
        let result = verify_state(SECRET, state, NOW, 600);
        assert!(
            matches!(
                result,
                Err(StateError::Malformed) | Err(StateError::BadSignature)
            ),
            "state {:?} gave {:?}",
            state,
            result
        );
    }
}

#[test]
fn test_state_checks_survive_extreme_timestamps() {
    let state = sign_state(SECRET, u64::MAX).unwrap();

    // Issued at the end of time, checked at the end of time
    assert_eq!(verify_state(SECRET, &state, u64::MAX, 600), Ok(()));

    let state = sign_state(SECRET, NOW).unwrap();
    assert_eq!(
        verify_state(SECRET, &state, u64::MAX, 600),
        Err(StateError::Expired)
    );
}

#[test]
fn test_token_expiry_with_huge_lifetime() {
    let token = Token {
        access_token: "access".to_string(),
        refresh_token: "refresh".to_string(),
        scope: String::new(),
        token_type: "Bearer".to_string(),
        expires_in: u64::MAX,
        obtained_at: NOW,
    };

    // Saturates instead of overflowing
    assert_eq!(token.expires_at(), u64::MAX);
    assert!(!token.is_expired(NOW));
}

#[test]
fn test_mask_token() {
    let masked = mask_token("BQDxyz1234567890");
    assert_eq!(masked, "BQDxyz…(16)");
    assert!(!masked.contains("1234567890"));

    // Short values are hidden completely
    assert_eq!(mask_token("abc"), "***(3)");
}

#[test]
fn test_truncate_chars() {
    assert_eq!(truncate_chars("hello", 10), ("hello".to_string(), false));
    assert_eq!(truncate_chars("hello", 5), ("hello".to_string(), false));
    assert_eq!(truncate_chars("hello", 3), ("hel".to_string(), true));

    // Must not split multi-byte characters
    assert_eq!(truncate_chars("Björk Sigur Rós", 3), ("Bjö".to_string(), true));
    assert_eq!(truncate_chars("日本語の歌", 2), ("日本".to_string(), true));
}

#[test]
fn test_clamp_limit() {
    assert_eq!(clamp_limit(None, 20), 20);
    assert_eq!(clamp_limit(Some(0), 20), 1);
    assert_eq!(clamp_limit(Some(10), 20), 10);
    assert_eq!(clamp_limit(Some(500), 20), 50);
}

#[test]
fn test_time_range_parsing() {
    assert_eq!("short_term".parse::<TimeRange>(), Ok(TimeRange::ShortTerm));
    assert_eq!("LONG".parse::<TimeRange>(), Ok(TimeRange::LongTerm));
    assert_eq!(TimeRange::default(), TimeRange::MediumTerm);
    assert!("forever".parse::<TimeRange>().is_err());
}

#[test]
fn test_artist_ids_are_unique_and_ordered() {
    let tracks = vec![
        create_test_track("one", &[("a1", "Artist 1"), ("a2", "Artist 2")]),
        create_test_track("two", &[("a2", "Artist 2"), ("a3", "Artist 3")]),
    ];

    assert_eq!(artist_ids(&tracks), vec!["a1", "a2", "a3"]);
}

#[test]
fn test_enrich_tracks_joins_genres() {
    let tracks = vec![create_test_track(
        "song",
        &[("a1", "Artist 1"), ("a2", "Artist 2"), ("a9", "Unknown")],
    )];
    let artists = vec![
        create_test_artist("a1", "Artist 1", &["indie", "rock"]),
        create_test_artist("a2", "Artist 2", &["rock", "shoegaze"]),
    ];

    let enriched = enrich_tracks(&tracks, &artists);

    assert_eq!(enriched.len(), 1);
    let track = &enriched[0];
    assert_eq!(track.album, "song album");
    assert_eq!(track.artists[0].genres, vec!["indie", "rock"]);
    assert!(track.artists[2].genres.is_empty());

    // Union without duplicates, first-seen order
    assert_eq!(track.genres, vec!["indie", "rock", "shoegaze"]);
}

#[test]
fn test_compact_shapes() {
    let track = create_test_track("song", &[("a1", "Artist 1")]);
    let compact = compact_tracks(std::slice::from_ref(&track));
    assert_eq!(compact[0].artists, vec!["Artist 1"]);
    assert_eq!(compact[0].album, "song album");

    let plays = compact_recent(&[PlayHistory {
        track,
        played_at: "2024-01-01T10:00:00Z".to_string(),
    }]);
    assert_eq!(plays[0].track, "song");
    assert_eq!(plays[0].played_at, "2024-01-01T10:00:00Z");
}
