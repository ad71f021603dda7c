use std::path::Path;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use rand::Rng;
use sysinfo::{Disks, Networks, System};

use super::callbacks::{CallbackId, Callbacks};
use super::poll::PollState;
use crate::models::SystemStats;

pub trait StatsSampler: Send {
    fn sample(&mut self) -> SystemStats;
}

/// Reads CPU, memory, root-disk and network counters through `sysinfo`.
pub struct SysinfoSampler {
    system: System,
}

impl SysinfoSampler {
    pub fn new() -> Self {
        let mut system = System::new();
        // CPU usage is a delta; prime it so the first sample is meaningful.
        system.refresh_cpu_usage();
        Self { system }
    }
}

impl Default for SysinfoSampler {
    fn default() -> Self {
        Self::new()
    }
}

impl StatsSampler for SysinfoSampler {
    fn sample(&mut self) -> SystemStats {
        self.system.refresh_cpu_usage();
        self.system.refresh_memory();

        let total_mem = self.system.total_memory();
        let ram_percent = if total_mem > 0 {
            self.system.used_memory() as f32 / total_mem as f32 * 100.0
        } else {
            0.0
        };

        let disks = Disks::new_with_refreshed_list();
        let root = disks
            .list()
            .iter()
            .find(|d| d.mount_point() == Path::new("/"))
            .or_else(|| disks.list().first());
        let disk_percent = root
            .filter(|d| d.total_space() > 0)
            .map(|d| {
                let used = d.total_space().saturating_sub(d.available_space());
                used as f32 / d.total_space() as f32 * 100.0
            })
            .unwrap_or(0.0);

        let networks = Networks::new_with_refreshed_list();
        let (net_sent, net_recv) = networks
            .list()
            .values()
            .fold((0u64, 0u64), |(sent, recv), data| {
                (sent + data.total_transmitted(), recv + data.total_received())
            });

        SystemStats {
            cpu_percent: self.system.global_cpu_usage(),
            ram_percent,
            disk_percent,
            net_sent,
            net_recv,
        }
    }
}

/// Stand-in numbers for machines where sampling is unwanted.
pub struct SimulatedSampler;

impl StatsSampler for SimulatedSampler {
    fn sample(&mut self) -> SystemStats {
        let mut rng = rand::thread_rng();
        SystemStats {
            cpu_percent: rng.gen_range(10..=60) as f32,
            ram_percent: rng.gen_range(30..=80) as f32,
            disk_percent: 45.0,
            net_sent: 0,
            net_recv: 0,
        }
    }
}

pub struct SystemService {
    sampler: Mutex<Box<dyn StatsSampler>>,
    stats: Mutex<SystemStats>,
    callbacks: Callbacks<SystemStats>,
    poll: PollState,
    poll_interval: Duration,
}

impl SystemService {
    pub fn new(sampler: Box<dyn StatsSampler>, poll_interval: Duration) -> Self {
        Self {
            sampler: Mutex::new(sampler),
            stats: Mutex::new(SystemStats::default()),
            callbacks: Callbacks::new("System"),
            poll: PollState::new(),
            poll_interval,
        }
    }

    pub fn add_callback<F>(&self, func: F) -> CallbackId
    where
        F: Fn(&SystemStats) + Send + Sync + 'static,
    {
        self.callbacks.add(func)
    }

    pub fn remove_callback(&self, id: CallbackId) -> bool {
        self.callbacks.remove(id)
    }

    pub fn stats(&self) -> SystemStats {
        self.stats.lock().map(|s| *s).unwrap_or_default()
    }

    /// Takes one sample, stores it and notifies listeners. Blocking.
    pub fn refresh(&self) -> SystemStats {
        let sample = match self.sampler.lock() {
            Ok(mut sampler) => sampler.sample(),
            Err(_) => {
                log::error!("[System] Sampler lock poisoned");
                return self.stats();
            }
        };
        if let Ok(mut stats) = self.stats.lock() {
            *stats = sample;
        }
        log::debug!(
            "[System] cpu={:.0}% ram={:.0}% disk={:.0}%",
            sample.cpu_percent,
            sample.ram_percent,
            sample.disk_percent
        );
        self.callbacks.notify(&sample);
        sample
    }

    pub fn start_polling(self: &Arc<Self>) {
        let Some(generation) = self.poll.start() else {
            return;
        };
        let service = Arc::clone(self);
        tokio::spawn(async move {
            while service.poll.is_current(generation) {
                let worker = Arc::clone(&service);
                if let Err(e) = tokio::task::spawn_blocking(move || worker.refresh()).await {
                    log::error!("[System] Sampling task failed: {:?}", e);
                }
                tokio::time::sleep(service.poll_interval).await;
            }
        });
        log::info!("[System] Polling started (every {}s)", self.poll_interval.as_secs());
    }

    pub fn stop_polling(&self) {
        if self.poll.stop() {
            log::info!("[System] Polling stopped");
        }
    }
}
