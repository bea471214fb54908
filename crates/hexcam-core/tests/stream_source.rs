use std::io::Cursor;

use hexcam_core::color::Rgb;
use hexcam_core::pipeline::{FrameRenderer, StreamEvent, spawn_stream_reader};
use hexcam_core::source::{LineSource, SerialLineSource, TextLineSource};
use hexcam_core::{ColorModel, FrameConfig, GroupLayout};

#[test]
fn text_source_reads_golden_fixture() {
    let path = std::path::Path::new(env!("CARGO_MANIFEST_DIR"))
        .join("..")
        .join("..")
        .join("tests")
        .join("golden")
        .join("packed_luma")
        .join("input.txt");
    let mut source = TextLineSource::open(&path).unwrap();

    let mut lines = 0;
    while let Some(_line) = source.next_line().unwrap() {
        lines += 1;
    }

    assert_eq!(lines, 3);
}

#[test]
fn streamed_frames_render_like_the_firmware_sends_them() {
    let config = FrameConfig {
        width: 2,
        height: 2,
        layout: GroupLayout::Yuyv,
        color_model: ColorModel::FullYuv,
        ..FrameConfig::default()
    };
    let wire = b"# frame 0\r\n10 80 20 80\r\n30 80\r\n40 80\r\n# frame 1\r\nff 80 ff 80\r\n";
    let source = SerialLineSource::new(Cursor::new(wire.to_vec()));
    let reader = spawn_stream_reader(source, config, 2).unwrap();

    let mut renderer = FrameRenderer::new(config.width, config.height);
    let mut completed = Vec::new();
    let mut statuses = Vec::new();
    for event in reader.iter() {
        if let StreamEvent::Status(text) = &event {
            statuses.push(text.clone());
        }
        if let Some(frame) = renderer.apply(&event).unwrap() {
            completed.push(frame);
        }
    }
    let summary = reader.join().unwrap();

    assert_eq!(statuses, vec!["# frame 0", "# frame 1"]);
    assert_eq!(completed.len(), 1);
    let first = &completed[0];
    assert_eq!(first.pixel(0, 0), Some(Rgb::gray(0x10)));
    assert_eq!(first.pixel(1, 0), Some(Rgb::gray(0x20)));
    assert_eq!(first.pixel(0, 1), Some(Rgb::gray(0x30)));
    assert_eq!(first.pixel(1, 1), Some(Rgb::gray(0x40)));

    let live = renderer.frame();
    assert_eq!(live.pixel(0, 0), Some(Rgb::gray(0xff)));
    assert_eq!(live.pixel(0, 1), Some(Rgb::gray(0)));
    assert_eq!(summary.stats.frame.frames, 2);
}
