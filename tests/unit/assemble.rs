use super::*;
use crate::config::PanZoomParams;
use crate::encode::sink::InMemorySink;
use crate::report::RecordingReporter;
use crate::scene::{ResolvedImage, SceneBuilder, SceneMode};

const RED: [u8; 4] = [255, 0, 0, 255];
const BLUE: [u8; 4] = [0, 0, 255, 255];

fn canvas() -> Canvas {
    Canvas {
        width: 20,
        height: 36,
    }
}

fn fps() -> Fps {
    Fps::integer(10).unwrap()
}

fn solid(color: [u8; 4], seconds: f64) -> ResolvedImage {
    ResolvedImage {
        image: image::RgbaImage::from_pixel(40, 72, image::Rgba(color)),
        seconds,
        direction: None,
    }
}

fn scenes() -> Vec<Scene> {
    let b = SceneBuilder::new(canvas(), fps(), [255, 255, 255]);
    let mode = SceneMode::PanZoom(PanZoomParams::default());
    vec![
        b.build(0, solid(RED, 0.5), &mode).unwrap(),
        b.build(1, solid(BLUE, 0.3), &mode).unwrap(),
    ]
}

fn center(frame: &FrameRGBA) -> [u8; 4] {
    frame.pixel(frame.width / 2, frame.height / 2)
}

fn close(a: [u8; 4], b: [u8; 4]) -> bool {
    a.iter().zip(b).all(|(&x, y)| x.abs_diff(y) <= 1)
}

fn run(assembler: &Assembler) -> InMemorySink {
    let mut sink = InMemorySink::new();
    assembler
        .assemble(scenes(), None, None, &mut sink, &crate::report::NullReporter)
        .unwrap();
    sink
}

#[test]
fn hard_cut_emits_each_frame_once_in_order() {
    let sink = run(&Assembler::new(canvas(), fps()));
    assert!(sink.is_finished());
    assert_eq!(sink.config().unwrap().total_frames, 8);
    let frames = sink.frames();
    assert_eq!(frames.len(), 8);
    for (i, (idx, _)) in frames.iter().enumerate() {
        assert_eq!(idx.0, i as u64);
    }
    assert!(close(center(&frames[4].1), RED));
    assert!(close(center(&frames[5].1), BLUE));
}

#[test]
fn parallel_rejoin_matches_sequential_output() {
    let dir = tempfile::tempdir().unwrap();
    let seq = run(&Assembler::new(canvas(), fps()));
    let par = run(&Assembler::new(canvas(), fps()).with_parallel(
        RenderThreading {
            parallel: true,
            threads: 2,
            chunk_scenes: 0,
        },
        dir.path().join("spool"),
    ));
    assert_eq!(seq.frames(), par.frames());
    let leftovers = std::fs::read_dir(dir.path().join("spool")).unwrap().count();
    assert_eq!(leftovers, 0, "spool files are removed after assembly");
}

#[test]
fn crossfade_blends_the_head_of_the_next_scene() {
    let sink = run(
        &Assembler::new(canvas(), fps()).with_boundary(BoundaryPolicy::Crossfade { frames: 2 }),
    );
    let frames = sink.frames();
    assert_eq!(frames.len(), 8, "crossfade keeps the total frame count");
    assert!(close(center(&frames[4].1), RED));
    let first = center(&frames[5].1);
    let second = center(&frames[6].1);
    assert!(first[0] > first[2], "{first:?}");
    assert!(second[0] < second[2], "{second:?}");
    assert!(close(center(&frames[7].1), BLUE));
}

#[test]
fn rejects_empty_and_mismatched_input() {
    let mut sink = InMemorySink::new();
    let a = Assembler::new(canvas(), fps());
    let err = a
        .assemble(Vec::new(), None, None, &mut sink, &crate::report::NullReporter)
        .unwrap_err();
    assert!(matches!(err, ReelError::Assembly(_)));

    let other = Assembler::new(Canvas::new(40, 36).unwrap(), fps());
    let err = other
        .assemble(scenes(), None, None, &mut sink, &crate::report::NullReporter)
        .unwrap_err();
    assert!(matches!(err, ReelError::Assembly(_)));
    assert!(sink.config().is_none(), "sink never started");
}

/// Records the largest spool directory size seen while frames are pushed.
struct SpoolWatchSink {
    dir: std::path::PathBuf,
    peak_bytes: u64,
    frames: u64,
}

impl FrameSink for SpoolWatchSink {
    fn begin(&mut self, _cfg: SinkConfig) -> ReelResult<()> {
        Ok(())
    }

    fn push_frame(&mut self, _idx: FrameIndex, _frame: &FrameRGBA) -> ReelResult<()> {
        let bytes: u64 = std::fs::read_dir(&self.dir)
            .unwrap()
            .map(|e| e.unwrap().metadata().unwrap().len())
            .sum();
        self.peak_bytes = self.peak_bytes.max(bytes);
        self.frames += 1;
        Ok(())
    }

    fn end(&mut self) -> ReelResult<()> {
        Ok(())
    }
}

#[test]
fn parallel_spool_holds_at_most_one_chunk_of_scenes() {
    let dir = tempfile::tempdir().unwrap();
    let spool_dir = dir.path().join("spool");
    let b = SceneBuilder::new(canvas(), fps(), [255, 255, 255]);
    let mode = SceneMode::PanZoom(PanZoomParams::default());
    let scenes: Vec<Scene> = [RED, BLUE, RED, BLUE]
        .into_iter()
        .enumerate()
        .map(|(i, c)| b.build(i, solid(c, 0.6), &mode).unwrap())
        .collect();
    let scene_bytes = 6 * canvas().byte_len() as u64;

    let mut sink = SpoolWatchSink {
        dir: spool_dir.clone(),
        peak_bytes: 0,
        frames: 0,
    };
    Assembler::new(canvas(), fps())
        .with_parallel(
            RenderThreading {
                parallel: true,
                threads: 2,
                chunk_scenes: 2,
            },
            &spool_dir,
        )
        .assemble(scenes, None, None, &mut sink, &crate::report::NullReporter)
        .unwrap();

    assert_eq!(sink.frames, 24);
    assert!(sink.peak_bytes > 0);
    assert!(
        sink.peak_bytes <= 2 * scene_bytes,
        "peak {} bytes, whole video {}",
        sink.peak_bytes,
        4 * scene_bytes
    );
    assert_eq!(std::fs::read_dir(&spool_dir).unwrap().count(), 0);
}

struct FailingSink {
    fail_at: u64,
    ended: bool,
}

impl FrameSink for FailingSink {
    fn begin(&mut self, _cfg: SinkConfig) -> ReelResult<()> {
        Ok(())
    }

    fn push_frame(&mut self, idx: FrameIndex, _frame: &FrameRGBA) -> ReelResult<()> {
        if idx.0 == self.fail_at {
            return Err(ReelError::assembly("disk full"));
        }
        Ok(())
    }

    fn end(&mut self) -> ReelResult<()> {
        self.ended = true;
        Ok(())
    }
}

#[test]
fn sink_failure_aborts_without_finishing() {
    let mut sink = FailingSink {
        fail_at: 6,
        ended: false,
    };
    let err = Assembler::new(canvas(), fps())
        .assemble(scenes(), None, None, &mut sink, &crate::report::NullReporter)
        .unwrap_err();
    assert!(err.to_string().contains("disk full"));
    assert!(!sink.ended);
}

#[test]
fn progress_is_reported_per_scene() {
    let rec = RecordingReporter::new();
    let mut sink = InMemorySink::new();
    Assembler::new(canvas(), fps())
        .assemble(scenes(), None, None, &mut sink, &rec)
        .unwrap();
    let progress: Vec<(u64, u64)> = rec
        .events()
        .into_iter()
        .filter_map(|e| match e {
            RenderEvent::Progress { done, total } => Some((done, total)),
            _ => None,
        })
        .collect();
    assert_eq!(progress, vec![(5, 8), (8, 8)]);
}

#[test]
fn captions_are_burned_without_changing_frame_count() {
    use crate::captions::track::{CaptionSpec, CharTiming};
    let track = CaptionTrack::new(CaptionSpec {
        text: "hi".to_string(),
        alignment: vec![
            CharTiming {
                ch: 'h',
                start: 0.0,
                end: 0.1,
            },
            CharTiming {
                ch: 'i',
                start: 0.1,
                end: 0.2,
            },
        ],
        highlighted_words: Vec::new(),
        highlight_color: None,
    })
    .unwrap();
    let mut sink = InMemorySink::new();
    let stats = Assembler::new(canvas(), fps())
        .assemble(
            scenes(),
            Some(&track),
            None,
            &mut sink,
            &crate::report::NullReporter,
        )
        .unwrap();
    assert_eq!(stats, AssemblyStats { scenes: 2, frames: 8 });
    // Nothing is visible before the first character ends.
    assert!(close(center(&sink.frames()[0].1), RED));
}
