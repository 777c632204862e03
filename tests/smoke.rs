use glam::Vec3;
use soundscape_audio::SoundInstance;
use soundscape_core::{SimTick, SoundKey};
use soundscape_testkit::{JsonlSink, PlaybackEvent};

#[test]
fn playback_stream_can_be_written() {
    let path = std::env::temp_dir().join("soundscape-eventlog.jsonl");
    let mut sink = JsonlSink::create(&path).expect("can create temp log");
    let tick = SimTick::ZERO.advance(1);
    let key = SoundKey::parse("dsurround:waterdrops").expect("valid key");
    let sound = SoundInstance::new(key, Vec3::new(1.0, 2.0, 3.0)).with_volume(0.5);
    sink.write(&PlaybackEvent::from_sound(tick, "play", &sound))
        .expect("can write event");
    drop(sink);

    let contents = std::fs::read_to_string(&path).expect("log is readable");
    let line: serde_json::Value =
        serde_json::from_str(contents.trim()).expect("one JSON object per line");
    assert_eq!(line["sound"], "dsurround:waterdrops");
    assert_eq!(line["kind"], "play");
    assert_eq!(line["position"][2], 3.0);
}
