use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct SystemStats {
    pub cpu_percent: f32,
    pub ram_percent: f32,
    pub disk_percent: f32,
    pub net_sent: u64,
    pub net_recv: u64,
}

impl SystemStats {
    /// Gauge fractions for CPU, RAM and disk, clamped to `0.0..=1.0`.
    pub fn gauges(&self) -> [(&'static str, f32); 3] {
        let frac = |p: f32| (p / 100.0).clamp(0.0, 1.0);
        [
            ("CPU", frac(self.cpu_percent)),
            ("RAM", frac(self.ram_percent)),
            ("SSD", frac(self.disk_percent)),
        ]
    }
}
