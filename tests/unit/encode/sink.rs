use super::*;
use crate::foundation::core::Canvas;

fn cfg() -> SinkConfig {
    SinkConfig {
        width: 2,
        height: 2,
        fps: Fps::integer(30).unwrap(),
        total_frames: 2,
        audio: None,
    }
}

#[test]
fn in_memory_sink_keeps_frames_in_order() {
    let frame = FrameRGBA::filled(Canvas::new(2, 2).unwrap(), [1, 2, 3, 255]);
    let mut sink = InMemorySink::new();
    sink.begin(cfg()).unwrap();
    sink.push_frame(FrameIndex(0), &frame).unwrap();
    sink.push_frame(FrameIndex(1), &frame).unwrap();
    sink.end().unwrap();

    assert!(sink.is_finished());
    assert_eq!(sink.config().unwrap().total_frames, 2);
    let idx: Vec<u64> = sink.frames().iter().map(|(i, _)| i.0).collect();
    assert_eq!(idx, vec![0, 1]);
}

#[test]
fn in_memory_sink_rejects_gaps() {
    let frame = FrameRGBA::filled(Canvas::new(2, 2).unwrap(), [0, 0, 0, 255]);
    let mut sink = InMemorySink::new();
    sink.begin(cfg()).unwrap();
    assert!(sink.push_frame(FrameIndex(1), &frame).is_err());
}
