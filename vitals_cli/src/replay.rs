//! Deterministic replay of recorded sample streams.

use crate::render::{print_event, print_snapshot, snapshot_text};
use eyre::Result;
use std::path::Path;
use vitals_config::{MotionRow, PpgRow};
use vitals_core::fall_alert::FallEdge;
use vitals_core::{
    FallAlert, MotionDetector, MotionPipeline, NodeCfg, NodeEvent, SensorSnapshot,
    SensorStateStore, VitalEstimator, VitalPipeline,
};
use vitals_traits::{InertialSample, PpgSample};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ReplaySummary {
    pub motion_samples: usize,
    pub ppg_samples: usize,
    pub steps: u32,
    pub falls: u32,
}

fn inertial(r: &MotionRow) -> InertialSample {
    InertialSample {
        ax: r.ax,
        ay: r.ay,
        az: r.az,
        gx: r.gx,
        gy: r.gy,
        gz: r.gz,
        t_ms: r.t_ms,
    }
}

/// Feed both recordings through fresh pipelines in timestamp order and
/// hand every motion event to `on_event`.
pub fn replay_rows(
    cfg: &NodeCfg,
    motion: &[MotionRow],
    ppg: &[PpgRow],
    mut on_event: impl FnMut(NodeEvent),
) -> Result<(ReplaySummary, SensorSnapshot)> {
    let store = SensorStateStore::new();
    let detector = MotionDetector::with_config(cfg.motion.clone(), cfg.sampling.motion_hz as f32)?;
    let mut mp = MotionPipeline::new(detector, FallAlert::new(cfg.fall_alert));
    let mut vp = VitalPipeline::new(VitalEstimator::new(cfg.vitals.clone())?);

    let mut m = motion.iter().peekable();
    let mut p = ppg.iter().peekable();
    loop {
        // Ties go to motion; both streams are already time-ordered.
        let take_motion = match (m.peek(), p.peek()) {
            (Some(mr), Some(pr)) => u64::from(mr.t_ms) * 1000 <= pr.t_us,
            (Some(_), None) => true,
            (None, Some(_)) => false,
            (None, None) => break,
        };
        if take_motion {
            let Some(row) = m.next() else { break };
            let u = mp.process(&inertial(row), &store);
            let t_ms = row.t_ms;
            if u.step {
                on_event(NodeEvent::Step {
                    total: u.steps,
                    t_ms,
                });
            }
            if u.fall.fall_detected {
                on_event(NodeEvent::Fall {
                    result: u.fall,
                    t_ms,
                });
            }
            if u.edge == FallEdge::Falling {
                on_event(NodeEvent::FallCleared { t_ms });
            }
        } else {
            let Some(row) = p.next() else { break };
            vp.process(
                &PpgSample {
                    red: row.red,
                    ir: row.ir,
                },
                row.t_us,
                &store,
            );
        }
    }

    let summary = ReplaySummary {
        motion_samples: motion.len(),
        ppg_samples: ppg.len(),
        steps: mp.steps(),
        falls: mp.falls(),
    };
    tracing::info!(?summary, "replay finished");
    Ok((summary, store.snapshot()))
}

pub fn replay(cfg: &NodeCfg, motion: &Path, ppg: Option<&Path>, json: bool) -> Result<()> {
    let motion_rows = vitals_config::load_motion_csv(motion)?;
    let ppg_rows = match ppg {
        Some(path) => vitals_config::load_ppg_csv(path)?,
        None => Vec::new(),
    };
    let (summary, snap) = replay_rows(cfg, &motion_rows, &ppg_rows, |ev| print_event(&ev, json))?;
    if json {
        print_snapshot(&snap, true);
        println!(
            "{}",
            serde_json::json!({
                "type": "summary",
                "motion_samples": summary.motion_samples,
                "ppg_samples": summary.ppg_samples,
                "steps": summary.steps,
                "falls": summary.falls,
            })
        );
    } else {
        println!(
            "replayed {} motion / {} ppg samples: {} steps, {} falls",
            summary.motion_samples, summary.ppg_samples, summary.steps, summary.falls
        );
        println!("final: {}", snapshot_text(&snap));
    }
    Ok(())
}
