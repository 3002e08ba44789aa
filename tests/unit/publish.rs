use std::collections::HashMap;

use chrono::TimeZone;

use super::*;

fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
    let map: HashMap<String, String> = pairs
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect();
    move |k| map.get(k).cloned()
}

#[test]
fn target_reads_bucket_region_and_prefix() {
    let t = S3Target::from_lookup(lookup(&[
        ("AWS_S3_BUCKET", "reels"),
        ("AWS_S3_PREFIX", "videos/"),
    ]))
    .unwrap();
    assert_eq!(t.region, "us-east-1");
    let key = t.object_key("a.mp4");
    assert_eq!(key, "videos/a.mp4");
    assert_eq!(
        t.public_url(&key),
        "https://reels.s3.us-east-1.amazonaws.com/videos/a.mp4"
    );

    let bare = S3Target::from_lookup(lookup(&[("AWS_S3_BUCKET", "b"), ("AWS_REGION", "eu-west-1")]))
        .unwrap();
    assert_eq!(bare.object_key("x.mp4"), "x.mp4");
    assert_eq!(bare.region, "eu-west-1");
}

#[test]
fn missing_bucket_is_a_publish_error() {
    let err = S3Target::from_lookup(lookup(&[("AWS_S3_BUCKET", "  ")])).unwrap_err();
    assert!(matches!(err, ReelError::Publish(_)));
}

#[test]
fn publishing_a_missing_file_fails_without_running_the_cli() {
    let p = AwsCliPublisher::new(S3Target {
        bucket: "b".into(),
        region: "us-east-1".into(),
        prefix: String::new(),
    })
    .with_program("/nonexistent/aws");
    let err = p.publish(Path::new("/nonexistent/video.mp4")).unwrap_err();
    assert!(matches!(err, ReelError::Publish(_)));
}

#[test]
fn missing_cli_is_a_publish_error() {
    let dir = tempfile::tempdir().unwrap();
    let file = dir.path().join("v.mp4");
    std::fs::write(&file, b"x").unwrap();
    let p = AwsCliPublisher::new(S3Target {
        bucket: "b".into(),
        region: "us-east-1".into(),
        prefix: String::new(),
    })
    .with_program(dir.path().join("no-such-aws"));
    let err = p.publish(&file).unwrap_err();
    assert!(err.to_string().starts_with("publish error:"), "{err}");
}

#[test]
fn env_publisher_resolves_the_bucket_at_upload_time() {
    let dir = tempfile::tempdir().unwrap();
    let file = dir.path().join("v.mp4");
    std::fs::write(&file, b"x").unwrap();

    let unset = EnvS3Publisher::with_lookup(lookup(&[("AWS_REGION", "eu-west-1")]));
    let err = unset.publish(&file).unwrap_err();
    assert!(matches!(err, ReelError::Publish(_)));
    assert!(err.to_string().contains("AWS_S3_BUCKET"), "{err}");

    let set = EnvS3Publisher::with_lookup(lookup(&[("AWS_S3_BUCKET", "reels")]))
        .with_program(dir.path().join("no-such-aws"));
    let err = set.publish(&file).unwrap_err();
    assert!(err.to_string().contains("failed to run"), "{err}");
}

#[test]
fn generated_names_follow_the_timestamp_pattern() {
    let now = chrono::Local.with_ymd_and_hms(2024, 3, 9, 7, 5, 1).unwrap();
    let a = generate_output_name(now);
    let b = generate_output_name(now);
    assert!(a.starts_with("2024-03-09_07-05-01_"), "{a}");
    assert!(a.ends_with(".mp4"));
    let hex = &a["2024-03-09_07-05-01_".len()..a.len() - 4];
    assert_eq!(hex.len(), 8);
    assert!(hex.chars().all(|c| c.is_ascii_hexdigit()));
    assert_ne!(a, b);
}

#[test]
fn output_paths_resolve_under_the_output_dir() {
    let out = Path::new("output");
    assert_eq!(
        resolve_output_path(out, Some(Path::new("clip"))),
        PathBuf::from("output/clip.mp4")
    );
    assert_eq!(
        resolve_output_path(out, Some(Path::new("/tmp/x.mp4"))),
        PathBuf::from("/tmp/x.mp4")
    );
    let generated = resolve_output_path(out, None);
    assert!(generated.starts_with("output"));
    assert_eq!(generated.extension().unwrap(), "mp4");
}
