//! Behavior-loop tests against a recording bus and an in-memory mic,
//! driven tick by tick with synthetic timestamps.

use miko_core::{relay_channel, AudioFrame, Mode, SessionHandle, FRAME_SAMPLES};
use miko_motion::{
    BehaviorScheduler, CosmeticPose, IllumWord, JointPose, MicControl, MotionError, MotionResult,
    RobotBus, SchedulerConfig, ToneCommand, VelocityCommand,
};
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

#[derive(Debug, Clone, PartialEq)]
enum BusEvent {
    Joints(JointPose),
    Cosmetics(CosmeticPose),
    Illum(u32),
    Tone(ToneCommand),
    Velocity(VelocityCommand),
    Audio(Vec<i16>),
}

#[derive(Default)]
struct RecordingBus {
    events: Mutex<Vec<BusEvent>>,
}

impl RecordingBus {
    fn events(&self) -> Vec<BusEvent> {
        self.events.lock().unwrap().clone()
    }

    fn clear(&self) {
        self.events.lock().unwrap().clear();
    }

    fn record(&self, event: BusEvent) {
        self.events.lock().unwrap().push(event);
    }
}

impl RobotBus for RecordingBus {
    fn publish_joints(&self, pose: &JointPose) -> MotionResult<()> {
        self.record(BusEvent::Joints(*pose));
        Ok(())
    }

    fn publish_cosmetics(&self, pose: &CosmeticPose) -> MotionResult<()> {
        self.record(BusEvent::Cosmetics(*pose));
        Ok(())
    }

    fn publish_illum(&self, illum: IllumWord) -> MotionResult<()> {
        self.record(BusEvent::Illum(illum.word()));
        Ok(())
    }

    fn publish_tone(&self, tone: ToneCommand) -> MotionResult<()> {
        self.record(BusEvent::Tone(tone));
        Ok(())
    }

    fn publish_velocity(&self, velocity: &VelocityCommand) -> MotionResult<()> {
        self.record(BusEvent::Velocity(*velocity));
        Ok(())
    }

    fn publish_audio(&self, frame: &AudioFrame) -> MotionResult<()> {
        self.record(BusEvent::Audio(frame.samples().to_vec()));
        Ok(())
    }
}

/// Bus that records everything but refuses tone commands.
#[derive(Default)]
struct ToneFailBus {
    inner: RecordingBus,
}

impl RobotBus for ToneFailBus {
    fn publish_joints(&self, pose: &JointPose) -> MotionResult<()> {
        self.inner.publish_joints(pose)
    }

    fn publish_cosmetics(&self, pose: &CosmeticPose) -> MotionResult<()> {
        self.inner.publish_cosmetics(pose)
    }

    fn publish_illum(&self, illum: IllumWord) -> MotionResult<()> {
        self.inner.publish_illum(illum)
    }

    fn publish_tone(&self, _tone: ToneCommand) -> MotionResult<()> {
        Err(MotionError::Bus("tone channel down".into()))
    }

    fn publish_velocity(&self, velocity: &VelocityCommand) -> MotionResult<()> {
        self.inner.publish_velocity(velocity)
    }

    fn publish_audio(&self, frame: &AudioFrame) -> MotionResult<()> {
        self.inner.publish_audio(frame)
    }
}

#[derive(Debug, Default)]
struct MicState {
    muted: bool,
    mutes: u32,
    unmutes: u32,
}

/// Mic whose state the test can observe after the scheduler takes ownership.
#[derive(Clone, Default)]
struct SharedMic {
    state: Arc<Mutex<MicState>>,
}

impl MicControl for SharedMic {
    fn is_muted(&mut self) -> MotionResult<bool> {
        Ok(self.state.lock().unwrap().muted)
    }

    fn mute(&mut self) -> MotionResult<()> {
        let mut state = self.state.lock().unwrap();
        state.muted = true;
        state.mutes += 1;
        Ok(())
    }

    fn unmute(&mut self) -> MotionResult<()> {
        let mut state = self.state.lock().unwrap();
        state.muted = false;
        state.unmutes += 1;
        Ok(())
    }
}

struct Rig {
    session: SessionHandle,
    bus: Arc<RecordingBus>,
    mic: SharedMic,
    scheduler: BehaviorScheduler,
}

fn rig(config: SchedulerConfig) -> (Rig, miko_core::RelayProducer) {
    let session = SessionHandle::new();
    let (producer, consumer) = relay_channel(8);
    let bus = Arc::new(RecordingBus::default());
    let mic = SharedMic::default();
    let scheduler = BehaviorScheduler::new(
        session.clone(),
        consumer,
        bus.clone(),
        Box::new(mic.clone()),
        config,
    );
    (
        Rig {
            session,
            bus,
            mic,
            scheduler,
        },
        producer,
    )
}

fn reactive_config() -> SchedulerConfig {
    SchedulerConfig {
        hold: Duration::ZERO,
        blink_hold: Duration::from_millis(1),
        ..SchedulerConfig::default()
    }
}

#[test]
fn test_startup_reset_parks_neutral_with_mic_closed() {
    let (mut rig, _producer) = rig(reactive_config());
    rig.scheduler.startup_reset();

    let state = rig.mic.state.lock().unwrap();
    assert!(state.muted);
    assert_eq!(state.mutes, 1);
    drop(state);

    let events = rig.bus.events();
    assert!(events.contains(&BusEvent::Joints(JointPose::neutral())));
    assert!(events.contains(&BusEvent::Cosmetics(CosmeticPose::neutral())));
    assert!(events.contains(&BusEvent::Illum(IllumWord::for_mode(Mode::Idle).word())));
}

#[test]
fn test_listening_opens_and_closes_the_mic() {
    let (mut rig, _producer) = rig(reactive_config());
    let t0 = Instant::now();

    rig.session.set_requested_mode(Mode::Listening);
    rig.scheduler.tick(t0);
    assert_eq!(rig.scheduler.active_mode(), Mode::Listening);
    {
        let state = rig.mic.state.lock().unwrap();
        assert!(!state.muted);
        assert_eq!(state.unmutes, 1);
    }

    // Entry perks the ears and cocks the head within ±35°.
    let events = rig.bus.events();
    let perked = events.iter().any(|e| {
        matches!(e, BusEvent::Cosmetics(c) if c.ear_left == 0.0 && c.ear_right == 0.0)
    });
    assert!(perked);
    let cocked = events.iter().any(|e| {
        matches!(e, BusEvent::Joints(j) if j.yaw.abs() <= 35.0f32.to_radians() + 1e-6)
    });
    assert!(cocked);

    rig.session.set_requested_mode(Mode::Idle);
    rig.bus.clear();
    rig.scheduler.tick(t0 + Duration::from_millis(20));
    assert_eq!(rig.scheduler.active_mode(), Mode::Idle);
    {
        let state = rig.mic.state.lock().unwrap();
        assert!(state.muted);
        assert_eq!(state.mutes, 1);
    }
    // Exit recenters the head and ears.
    let events = rig.bus.events();
    let reset = events.iter().any(|e| {
        matches!(e, BusEvent::Joints(j) if j.yaw == 0.0)
    });
    assert!(reset);
}

#[test]
fn test_happy_chirp_plays_once_per_dwell() {
    let (mut rig, _producer) = rig(reactive_config());
    let t0 = Instant::now();
    let tick = Duration::from_millis(20);

    rig.session.set_requested_mode(Mode::Happy);
    for i in 0..5 {
        rig.scheduler.tick(t0 + tick * i);
    }
    let tones = |events: &[BusEvent]| {
        events
            .iter()
            .filter(|e| matches!(e, BusEvent::Tone(_)))
            .count()
    };
    assert_eq!(tones(&rig.bus.events()), 1);

    // Leaving happy re-arms the chirp for the next dwell.
    rig.session.set_requested_mode(Mode::Idle);
    rig.scheduler.tick(t0 + tick * 5);
    rig.session.set_requested_mode(Mode::Happy);
    rig.scheduler.tick(t0 + tick * 6);
    rig.scheduler.tick(t0 + tick * 7);
    assert_eq!(tones(&rig.bus.events()), 2);
}

#[test]
fn test_happy_exit_stops_the_body() {
    let (mut rig, _producer) = rig(reactive_config());
    let t0 = Instant::now();

    rig.session.set_requested_mode(Mode::Happy);
    rig.scheduler.tick(t0);
    rig.bus.clear();

    rig.session.set_requested_mode(Mode::Idle);
    rig.scheduler.tick(t0 + Duration::from_millis(20));
    assert!(rig
        .bus
        .events()
        .contains(&BusEvent::Velocity(VelocityCommand::stop())));
}

#[test]
fn test_expressive_hold_defers_the_exit() {
    let config = SchedulerConfig {
        hold: Duration::from_secs(3),
        ..reactive_config()
    };
    let (mut rig, _producer) = rig(config);
    let t0 = Instant::now();

    rig.session.set_requested_mode(Mode::Sad);
    rig.scheduler.tick(t0);
    assert_eq!(rig.scheduler.active_mode(), Mode::Sad);

    rig.session.set_requested_mode(Mode::Idle);
    rig.scheduler.tick(t0 + Duration::from_secs(1));
    assert_eq!(rig.scheduler.active_mode(), Mode::Sad);

    rig.scheduler.tick(t0 + Duration::from_secs(4));
    assert_eq!(rig.scheduler.active_mode(), Mode::Idle);
}

#[test]
fn test_relayed_audio_is_republished_in_order() {
    let (mut rig, mut producer) = rig(reactive_config());
    for marker in [1i16, 2, 3] {
        let mut samples = vec![0i16; FRAME_SAMPLES];
        samples[0] = marker;
        assert!(producer.push(AudioFrame::from_samples(samples)));
    }

    rig.scheduler.tick(Instant::now());

    let markers: Vec<i16> = rig
        .bus
        .events()
        .iter()
        .filter_map(|e| match e {
            BusEvent::Audio(samples) => Some(samples[0]),
            _ => None,
        })
        .collect();
    assert_eq!(markers, vec![1, 2, 3]);
}

#[test]
fn test_blink_fires_when_idle_only() {
    let config = SchedulerConfig {
        blink_interval: Duration::from_millis(10),
        blink_hold: Duration::from_millis(1),
        hold: Duration::ZERO,
        ..SchedulerConfig::default()
    };
    let (mut rig, _producer) = rig(config);
    let t0 = Instant::now();

    rig.scheduler.tick(t0 + Duration::from_millis(50));
    let events = rig.bus.events();
    let closed = events.iter().position(|e| {
        matches!(e, BusEvent::Cosmetics(c) if c.eyelid_left == 1.0 && c.eyelid_right == 1.0)
    });
    let reopened = events.iter().rposition(|e| {
        matches!(e, BusEvent::Cosmetics(c) if c.eyelid_left == 0.0 && c.eyelid_right == 0.0)
    });
    match (closed, reopened) {
        (Some(c), Some(r)) => assert!(c < r),
        other => panic!("expected close-then-open cosmetics, got {other:?}"),
    }

    // Sad keeps the eyes shut itself; no blink runs there.
    rig.session.set_requested_mode(Mode::Sad);
    rig.scheduler.tick(t0 + Duration::from_millis(70));
    rig.bus.clear();
    rig.scheduler.tick(t0 + Duration::from_millis(200));
    let cosmetics = rig
        .bus
        .events()
        .iter()
        .filter(|e| matches!(e, BusEvent::Cosmetics(_)))
        .count();
    assert_eq!(cosmetics, 1);
}

#[test]
fn test_step_failure_falls_back_to_idle() {
    let session = SessionHandle::new();
    let (_producer, consumer) = relay_channel(8);
    let bus = Arc::new(ToneFailBus::default());
    let mut scheduler = BehaviorScheduler::new(
        session.clone(),
        consumer,
        bus.clone(),
        Box::new(SharedMic::default()),
        reactive_config(),
    );

    let t0 = Instant::now();
    session.set_requested_mode(Mode::Happy);
    scheduler.tick(t0);
    assert_eq!(scheduler.active_mode(), Mode::Idle);

    // The loop keeps running in idle afterwards.
    scheduler.tick(t0 + Duration::from_millis(20));
    assert_eq!(scheduler.active_mode(), Mode::Idle);
}

#[test]
fn test_agent_speaking_overrides_the_requested_mode() {
    let (mut rig, _producer) = rig(reactive_config());
    let t0 = Instant::now();

    rig.session.set_requested_mode(Mode::Idle);
    rig.session.set_agent_speaking(true);
    rig.scheduler.tick(t0);
    assert_eq!(rig.scheduler.active_mode(), Mode::Speaking);

    rig.session.set_agent_speaking(false);
    rig.scheduler.tick(t0 + Duration::from_millis(20));
    assert_eq!(rig.scheduler.active_mode(), Mode::Idle);
}

#[test]
fn test_run_honors_the_stop_flag() {
    use std::sync::atomic::{AtomicBool, Ordering};

    let (rig, _producer) = rig(reactive_config());
    let Rig {
        bus, mut scheduler, ..
    } = rig;
    let stop = Arc::new(AtomicBool::new(false));

    let flag = stop.clone();
    let handle = std::thread::spawn(move || {
        scheduler.run(&flag);
    });
    std::thread::sleep(Duration::from_millis(100));
    stop.store(true, Ordering::Relaxed);
    handle.join().unwrap();

    // Shutdown leaves the robot in idle illumination.
    let events = bus.events();
    assert_eq!(
        events.last(),
        Some(&BusEvent::Illum(IllumWord::for_mode(Mode::Idle).word()))
    );
}
