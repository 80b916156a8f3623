use bytes::Bytes;
use merger_engine::{sha256_hex, MergedArtifact, ResultPackager};

fn artifact(bytes: &'static [u8]) -> MergedArtifact {
    MergedArtifact {
        bytes: Bytes::from_static(bytes),
        suggested_name: "merged_video.mp4".to_string(),
        media_type: "video/mp4".to_string(),
    }
}

#[test]
fn handle_reads_back_identical_bytes() {
    let packager = ResultPackager::new();
    let artifact = artifact(b"\x00\x00\x00\x18ftypmp42 merged");

    let handle = packager.package(&artifact);

    assert_eq!(packager.open(&handle), Some(artifact.bytes.clone()));
    assert_eq!(handle.len, artifact.bytes.len() as u64);
    assert_eq!(handle.sha256, sha256_hex(&artifact.bytes));
    assert_eq!(handle.media_type, "video/mp4");
    assert_eq!(handle.uri, format!("artifact://{}/merged_video.mp4", handle.id));
}

#[test]
fn packaging_twice_gives_independent_handles() {
    let packager = ResultPackager::new();
    let artifact = artifact(b"same bytes");

    let first = packager.package(&artifact);
    let second = packager.package(&artifact);

    assert_ne!(first.id, second.id);
    assert_ne!(first.uri, second.uri);
    assert_eq!(packager.live_handles(), 2);

    assert!(packager.revoke(&first));
    assert!(!packager.revoke(&first));
    assert_eq!(packager.open(&first), None);
    assert_eq!(packager.open(&second), Some(artifact.bytes));
}

#[test]
fn sha256_hex_matches_known_digest() {
    assert_eq!(
        sha256_hex(b""),
        "e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855"
    );
}
