//! Assembles producers around one shared store and runs them on sampler threads.

use crate::config::NodeCfg;
use crate::error::{BuildError, Result};
use crate::fall_alert::{FallAlert, FallEdge};
use crate::motion::{FallResult, MotionDetector};
use crate::pipeline::{MotionPipeline, VitalPipeline, write_ambient, write_location};
use crate::sampler::{Pacing, Sampler, SamplerStats};
use crate::store::{SensorSnapshot, SensorStateStore};
use crate::timebase::wrap_ms;
use crate::vitals::VitalEstimator;
use crossbeam_channel as xch;
use std::sync::Arc;
use vitals_traits::clock::{Clock, MonotonicClock};
use vitals_traits::{AmbientReading, InertialSample, LocationFix, PpgSample, SampleReader};

pub type BoxedReader<T> = Box<dyn SampleReader<Sample = T> + Send>;

/// Events buffered before new ones are dropped.
const EVENT_CAPACITY: usize = 64;

/// Discrete motion events, in the order the motion producer saw them.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum NodeEvent {
    Step { total: u32, t_ms: u32 },
    Fall { result: FallResult, t_ms: u32 },
    FallCleared { t_ms: u32 },
}

#[derive(Default)]
pub struct NodeBuilder {
    cfg: NodeCfg,
    motion: Option<BoxedReader<InertialSample>>,
    ppg: Option<BoxedReader<PpgSample>>,
    ambient: Option<BoxedReader<AmbientReading>>,
    location: Option<BoxedReader<LocationFix>>,
    clock: Option<Arc<dyn Clock + Send + Sync>>,
    store: Option<Arc<SensorStateStore>>,
}

impl NodeBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_config(mut self, cfg: NodeCfg) -> Self {
        self.cfg = cfg;
        self
    }

    pub fn motion_reader(mut self, r: impl SampleReader<Sample = InertialSample> + Send + 'static) -> Self {
        self.motion = Some(Box::new(r));
        self
    }

    pub fn ppg_reader(mut self, r: impl SampleReader<Sample = PpgSample> + Send + 'static) -> Self {
        self.ppg = Some(Box::new(r));
        self
    }

    pub fn ambient_reader(mut self, r: impl SampleReader<Sample = AmbientReading> + Send + 'static) -> Self {
        self.ambient = Some(Box::new(r));
        self
    }

    pub fn location_reader(mut self, r: impl SampleReader<Sample = LocationFix> + Send + 'static) -> Self {
        self.location = Some(Box::new(r));
        self
    }

    pub fn with_clock(mut self, clock: impl Clock + Send + Sync + 'static) -> Self {
        self.clock = Some(Arc::new(clock));
        self
    }

    /// Share an existing store instead of creating a fresh one.
    pub fn with_store(mut self, store: Arc<SensorStateStore>) -> Self {
        self.store = Some(store);
        self
    }

    pub fn build(self) -> Result<SensorNode> {
        if self.motion.is_none()
            && self.ppg.is_none()
            && self.ambient.is_none()
            && self.location.is_none()
        {
            return Err(BuildError::NoReaders.into());
        }
        let s = &self.cfg.sampling;
        if s.motion_hz == 0 || s.ppg_hz == 0 || s.ambient_hz == 0 {
            return Err(BuildError::InvalidConfig("sampling rates must be > 0").into());
        }

        let motion = match self.motion {
            Some(r) => {
                let detector =
                    MotionDetector::with_config(self.cfg.motion.clone(), s.motion_hz as f32)?;
                Some((r, MotionPipeline::new(detector, FallAlert::new(self.cfg.fall_alert))))
            }
            None => None,
        };
        let ppg = match self.ppg {
            Some(r) => Some((r, VitalPipeline::new(VitalEstimator::new(self.cfg.vitals.clone())?))),
            None => None,
        };

        Ok(SensorNode {
            store: self.store.unwrap_or_default(),
            clock: self.clock.unwrap_or_else(|| Arc::new(MonotonicClock::new())),
            motion,
            ppg,
            ambient: self.ambient,
            location: self.location,
            cfg: self.cfg,
        })
    }
}

/// A configured node that has not started sampling yet.
pub struct SensorNode {
    cfg: NodeCfg,
    store: Arc<SensorStateStore>,
    clock: Arc<dyn Clock + Send + Sync>,
    motion: Option<(BoxedReader<InertialSample>, MotionPipeline)>,
    ppg: Option<(BoxedReader<PpgSample>, VitalPipeline)>,
    ambient: Option<BoxedReader<AmbientReading>>,
    location: Option<BoxedReader<LocationFix>>,
}

impl SensorNode {
    pub fn builder() -> NodeBuilder {
        NodeBuilder::new()
    }

    pub fn store(&self) -> Arc<SensorStateStore> {
        self.store.clone()
    }

    /// Spawn one sampler per attached reader.
    pub fn start(self) -> Result<RunningNode> {
        let s = self.cfg.sampling;
        let retry = self.cfg.retry;
        let epoch = self.clock.now();
        let at_hz = |hz| Pacing::at_hz(hz, s.sensor_timeout, retry, epoch);
        let mut samplers = Vec::with_capacity(4);
        let (events_tx, events) = xch::bounded(EVENT_CAPACITY);

        if let Some((reader, mut pipeline)) = self.motion {
            let store = self.store.clone();
            samplers.push(Sampler::spawn(
                "motion",
                reader,
                at_hz(s.motion_hz),
                self.clock.clone(),
                move |sample: InertialSample, now_us| {
                    // Stamp with the node clock so all producers share one timeline.
                    let t_ms = wrap_ms(now_us);
                    let update = pipeline.process(&InertialSample { t_ms, ..sample }, &store);
                    let emit = |ev| {
                        // Consumer lagging or gone; the store still has the state.
                        let _ = events_tx.try_send(ev);
                    };
                    if update.step {
                        emit(NodeEvent::Step {
                            total: update.steps,
                            t_ms,
                        });
                    }
                    if update.fall.fall_detected {
                        emit(NodeEvent::Fall {
                            result: update.fall,
                            t_ms,
                        });
                    }
                    if update.edge == FallEdge::Falling {
                        emit(NodeEvent::FallCleared { t_ms });
                    }
                },
            )?);
        }
        if let Some((reader, mut pipeline)) = self.ppg {
            let store = self.store.clone();
            samplers.push(Sampler::spawn(
                "ppg",
                reader,
                at_hz(s.ppg_hz),
                self.clock.clone(),
                move |sample: PpgSample, now_us| {
                    pipeline.process(&sample, now_us, &store);
                },
            )?);
        }
        if let Some(reader) = self.ambient {
            let store = self.store.clone();
            samplers.push(Sampler::spawn(
                "ambient",
                reader,
                at_hz(s.ambient_hz),
                self.clock.clone(),
                move |reading: AmbientReading, _| write_ambient(&store, &reading),
            )?);
        }
        if let Some(reader) = self.location {
            let store = self.store.clone();
            samplers.push(Sampler::spawn(
                "location",
                reader,
                Pacing::every(s.location_period, s.sensor_timeout, retry, epoch),
                self.clock.clone(),
                move |fix: LocationFix, _| write_location(&store, &fix),
            )?);
        }

        tracing::info!(producers = samplers.len(), "sensor node started");
        Ok(RunningNode {
            store: self.store,
            samplers,
            events,
        })
    }
}

/// Handle to a node whose producers are running.
pub struct RunningNode {
    store: Arc<SensorStateStore>,
    samplers: Vec<Sampler>,
    events: xch::Receiver<NodeEvent>,
}

impl RunningNode {
    pub fn snapshot(&self) -> SensorSnapshot {
        self.store.snapshot()
    }

    pub fn store(&self) -> Arc<SensorStateStore> {
        self.store.clone()
    }

    /// Events produced since the last call.
    pub fn drain_events(&self) -> Vec<NodeEvent> {
        self.events.try_iter().collect()
    }

    pub fn stats(&self) -> Vec<SamplerStats> {
        self.samplers.iter().map(Sampler::stats).collect()
    }

    /// Stop and join every producer, then return the final record.
    pub fn stop(mut self) -> SensorSnapshot {
        for s in self.samplers.drain(..) {
            tracing::debug!(sampler = s.name(), "stopping sampler");
            drop(s);
        }
        tracing::info!("sensor node stopped");
        self.store.snapshot()
    }
}
