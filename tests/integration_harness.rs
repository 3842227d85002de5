//! Integration test harness for the blob simulation
//!
//! Drives a seeded scene through step/render sequences the way the driver
//! binary does, and checks the captured frames.

use blob_bounce::config::SceneParameters;
use blob_bounce::scenario::ScenarioGenerator;
use blob_bounce::{Domain, DomainSettings, Frame, Rgb};

/// Test harness for integration testing
pub struct TestHarness {
    domain: Domain,
    resolution: f64,
    frames: Vec<Frame>,
}

/// Steps that can be executed in a test scenario
#[derive(Debug, Clone)]
pub enum TestStep {
    /// Render a frame and capture the pixels
    RenderFrame,
    /// Advance the simulation by dt
    Step(f64),
    /// Advance the simulation n times by dt
    StepMany(u32, f64),
}

impl TestHarness {
    /// Create a harness around a generated scene
    pub fn new(params: SceneParameters) -> Self {
        let resolution = params.resolution;
        let background = params.background;
        let mut generator = ScenarioGenerator::new(params);
        let bounds = generator.bounds().expect("scene bounds");
        let blobs = generator.generate().expect("scene blobs");
        let domain = Domain::with_settings(
            blobs,
            bounds,
            background,
            DomainSettings {
                threads: Some(2),
                ..Default::default()
            },
        )
        .expect("domain");
        Self {
            domain,
            resolution,
            frames: Vec::new(),
        }
    }

    /// Render a frame and return it
    pub fn render_frame(&mut self) -> &Frame {
        let frame = self.domain.render(self.resolution).expect("render");
        self.frames.push(frame);
        self.frames.last().unwrap()
    }

    /// Get all captured frames
    pub fn frames(&self) -> &[Frame] {
        &self.frames
    }

    pub fn domain(&self) -> &Domain {
        &self.domain
    }

    /// Run a sequence of test steps and return captured frames
    pub fn run_scenario(&mut self, steps: &[TestStep]) -> Vec<Frame> {
        let mut captured = Vec::new();

        for step in steps {
            match step {
                TestStep::RenderFrame => {
                    captured.push(self.render_frame().clone());
                }
                TestStep::Step(dt) => {
                    self.domain.step(*dt).expect("step");
                }
                TestStep::StepMany(count, dt) => {
                    for _ in 0..*count {
                        self.domain.step(*dt).expect("step");
                    }
                }
            }
        }

        captured
    }
}

/// Small seeded scene: 64x64 pixels over a 1.92 x 1.92 box
fn small_scene(seed: u64) -> SceneParameters {
    SceneParameters {
        n_objects: 4,
        seed: Some(seed),
        width: 64,
        height: 64,
        resolution: 0.03,
        velocity: 0.5,
        ..Default::default()
    }
}

/// Helper to compute the average color of an RGB frame
pub fn average_color(pixels: &[u8]) -> (f64, f64, f64) {
    if pixels.is_empty() || pixels.len() % 3 != 0 {
        return (0.0, 0.0, 0.0);
    }

    let pixel_count = pixels.len() / 3;
    let mut r_sum = 0u64;
    let mut g_sum = 0u64;
    let mut b_sum = 0u64;

    for chunk in pixels.chunks_exact(3) {
        r_sum += chunk[0] as u64;
        g_sum += chunk[1] as u64;
        b_sum += chunk[2] as u64;
    }

    (
        r_sum as f64 / pixel_count as f64,
        g_sum as f64 / pixel_count as f64,
        b_sum as f64 / pixel_count as f64,
    )
}

/// Helper to compute the fraction of pixels that differ
pub fn frame_diff_ratio(a: &[u8], b: &[u8], tolerance: u8) -> f64 {
    if a.len() != b.len() || a.is_empty() {
        return 1.0;
    }

    let differing = a
        .chunks_exact(3)
        .zip(b.chunks_exact(3))
        .filter(|(pa, pb)| {
            pa.iter()
                .zip(pb.iter())
                .any(|(&ca, &cb)| (ca as i32 - cb as i32).abs() > tolerance as i32)
        })
        .count();

    differing as f64 / (a.len() / 3) as f64
}

// ============================================================================
// Integration Tests
// ============================================================================

#[test]
fn test_frame_matches_scene_size() {
    let mut harness = TestHarness::new(small_scene(1));
    let frame = harness.render_frame();
    assert_eq!((frame.width(), frame.height()), (64, 64));
    assert_eq!(frame.as_raw().len(), 64 * 64 * 3);
}

#[test]
fn test_frame_has_content() {
    let mut harness = TestHarness::new(small_scene(2));
    let frame = harness.render_frame();
    // white blobs on black: something must be lit
    assert!(frame.as_raw().iter().any(|&channel| channel > 0));
}

#[test]
fn test_scenario_execution() {
    let mut harness = TestHarness::new(small_scene(3));
    let scenario = vec![
        TestStep::RenderFrame,
        TestStep::StepMany(4, 0.025),
        TestStep::RenderFrame,
        TestStep::Step(0.025),
        TestStep::RenderFrame,
    ];

    let frames = harness.run_scenario(&scenario);
    assert_eq!(frames.len(), 3, "Should have captured 3 frames");
    assert_eq!(harness.frames().len(), 3);
    assert_eq!(harness.domain().steps(), 5);

    // blobs move at 0.5 units/s, several pixels over these steps
    assert_ne!(frames[0], frames[1], "Stepping should change the frame");
    assert_ne!(frames[1], frames[2], "Stepping should change the frame");
}

#[test]
fn test_seeded_runs_are_deterministic() {
    let scenario = vec![TestStep::StepMany(3, 0.025), TestStep::RenderFrame];
    let first = TestHarness::new(small_scene(11)).run_scenario(&scenario);
    let second = TestHarness::new(small_scene(11)).run_scenario(&scenario);
    assert_eq!(first, second);
}

#[test]
fn test_repeated_render_is_identical() {
    let mut harness = TestHarness::new(small_scene(4));
    let frames = harness.run_scenario(&[TestStep::RenderFrame, TestStep::RenderFrame]);
    assert_eq!(frame_diff_ratio(frames[0].as_raw(), frames[1].as_raw(), 0), 0.0);
}

#[test]
fn test_background_fills_empty_scene() {
    let params = SceneParameters {
        n_objects: 0,
        background: Rgb::new(30, 60, 90),
        ..small_scene(5)
    };
    let mut harness = TestHarness::new(params);
    let frame = harness.render_frame();
    let (r, g, b) = average_color(frame.as_raw());
    assert!((r - 30.0).abs() < 1e-9);
    assert!((g - 60.0).abs() < 1e-9);
    assert!((b - 90.0).abs() < 1e-9);
}

#[test]
fn test_frame_diff_utility() {
    let a = vec![255, 0, 0, 0, 255, 0];
    let b = vec![255, 0, 0, 0, 255, 0];
    let c = vec![0, 0, 255, 255, 255, 0];

    assert_eq!(frame_diff_ratio(&a, &b, 0), 0.0, "Identical frames");
    assert_eq!(frame_diff_ratio(&a, &c, 0), 1.0, "Completely different frames");
}

#[test]
fn test_average_color_utility() {
    let red = vec![255, 0, 0, 255, 0, 0];
    let (r, g, b) = average_color(&red);
    assert!((r - 255.0).abs() < 0.001);
    assert!(g.abs() < 0.001);
    assert!(b.abs() < 0.001);
}
