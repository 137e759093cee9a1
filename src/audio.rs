//! Audio sampling boundary: an `Analyser` hands out fixed-length byte
//! buffers (0–255) for the time or frequency domain; `FrameSamples`
//! memoizes each domain once per tick and shares the slice across every
//! layer that declared that domain. The crate ships one concrete analyser
//! over host-pushed PCM so tests and the CLI have a real implementation.

use rustfft::{Fft, FftPlanner, num_complex::Complex32};
use std::collections::VecDeque;
use std::f32::consts::PI;
use std::sync::Arc;

use crate::{
    error::{WavesceneError, WavesceneResult},
    model::Domain,
};

/// Boundary with the audio-capture/analysis subsystem.
pub trait Analyser {
    /// Fixed buffer length; constant for the analyser's lifetime.
    fn buffer_len(&self) -> usize;
    /// Current time-domain amplitude, centered on 128.
    fn time_domain(&mut self, out: &mut [u8]);
    /// Current frequency-domain magnitude buckets.
    fn frequency_domain(&mut self, out: &mut [u8]);
}

/// Play/pause control of the live audio source, exposed outward to the
/// host. Wiring failures are logged and degrade gracefully.
pub trait Transport {
    fn play(&mut self) -> WavesceneResult<()>;
    fn pause(&mut self) -> WavesceneResult<()>;
    fn is_playing(&self) -> bool;
}

/// Per-frame sample cache: each domain is extracted from the analyser at
/// most once per tick, however many layers read it.
#[derive(Debug)]
pub struct FrameSamples {
    time: Vec<u8>,
    frequency: Vec<u8>,
    have_time: bool,
    have_frequency: bool,
    pub time_extractions: u64,
    pub frequency_extractions: u64,
}

impl FrameSamples {
    pub fn new(buffer_len: usize) -> Self {
        Self {
            time: vec![0; buffer_len],
            frequency: vec![0; buffer_len],
            have_time: false,
            have_frequency: false,
            time_extractions: 0,
            frequency_extractions: 0,
        }
    }

    /// Invalidate both domains at the start of a tick.
    pub fn begin_frame(&mut self) {
        self.have_time = false;
        self.have_frequency = false;
    }

    pub fn sample(&mut self, analyser: &mut dyn Analyser, domain: Domain) -> &[u8] {
        match domain {
            Domain::Time => {
                if !self.have_time {
                    analyser.time_domain(&mut self.time);
                    self.have_time = true;
                    self.time_extractions += 1;
                }
                &self.time
            }
            Domain::Frequency => {
                if !self.have_frequency {
                    analyser.frequency_domain(&mut self.frequency);
                    self.have_frequency = true;
                    self.frequency_extractions += 1;
                }
                &self.frequency
            }
        }
    }
}

/// A silent analyser; every extraction is all zeros.
#[derive(Debug, Clone, Copy)]
pub struct SilentAnalyser(pub usize);

impl Analyser for SilentAnalyser {
    fn buffer_len(&self) -> usize {
        self.0
    }

    fn time_domain(&mut self, out: &mut [u8]) {
        out.fill(0);
    }

    fn frequency_domain(&mut self, out: &mut [u8]) {
        out.fill(0);
    }
}

const MIN_DECIBELS: f32 = -100.0;
const MAX_DECIBELS: f32 = -30.0;

/// Instance-owned analyser over mono f32 PCM pushed by the host. Keeps a
/// ring of the most recent samples; frequency extraction runs a
/// Hann-windowed forward FFT over twice the buffer length and maps bin
/// magnitudes onto the byte range through a fixed decibel window.
pub struct PcmAnalyser {
    buffer_len: usize,
    ring: VecDeque<f32>,
    fft: Arc<dyn Fft<f32>>,
    window: Vec<f32>,
    scratch: Vec<Complex32>,
}

impl std::fmt::Debug for PcmAnalyser {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PcmAnalyser")
            .field("buffer_len", &self.buffer_len)
            .field("ring_len", &self.ring.len())
            .finish()
    }
}

impl PcmAnalyser {
    pub fn new(buffer_len: usize) -> WavesceneResult<Self> {
        if buffer_len < 2 {
            return Err(WavesceneError::audio("analyser buffer length must be >= 2"));
        }
        let fft_size = buffer_len * 2;
        let fft = FftPlanner::new().plan_fft_forward(fft_size);
        let window = (0..fft_size)
            .map(|i| 0.5 * (1.0 - (2.0 * PI * i as f32 / fft_size as f32).cos()))
            .collect();
        Ok(Self {
            buffer_len,
            ring: VecDeque::with_capacity(fft_size),
            fft,
            window,
            scratch: vec![Complex32::new(0.0, 0.0); fft_size],
        })
    }

    /// Feed mono samples in [-1, 1]. Older samples beyond one FFT window
    /// are dropped.
    pub fn push_samples(&mut self, samples: &[f32]) {
        let cap = self.buffer_len * 2;
        for &s in samples {
            if self.ring.len() == cap {
                self.ring.pop_front();
            }
            self.ring.push_back(s);
        }
    }

    fn recent(&self, n: usize) -> impl Iterator<Item = f32> + '_ {
        let skip = self.ring.len().saturating_sub(n);
        let pad = n.saturating_sub(self.ring.len());
        std::iter::repeat(0.0)
            .take(pad)
            .chain(self.ring.iter().skip(skip).copied())
    }
}

impl Analyser for PcmAnalyser {
    fn buffer_len(&self) -> usize {
        self.buffer_len
    }

    fn time_domain(&mut self, out: &mut [u8]) {
        for (slot, s) in out.iter_mut().zip(self.recent(self.buffer_len)) {
            *slot = ((s.clamp(-1.0, 1.0) + 1.0) * 128.0).min(255.0) as u8;
        }
    }

    fn frequency_domain(&mut self, out: &mut [u8]) {
        let fft_size = self.buffer_len * 2;
        let samples: Vec<f32> = self.recent(fft_size).collect();
        for (i, s) in samples.into_iter().enumerate() {
            self.scratch[i] = Complex32::new(s * self.window[i], 0.0);
        }
        self.fft.process(&mut self.scratch);
        let norm = 1.0 / fft_size as f32;
        for (slot, bin) in out.iter_mut().zip(&self.scratch[..self.buffer_len]) {
            let magnitude = bin.norm() * norm;
            let db = 20.0 * magnitude.max(f32::MIN_POSITIVE).log10();
            let t = (db - MIN_DECIBELS) / (MAX_DECIBELS - MIN_DECIBELS);
            *slot = (t.clamp(0.0, 1.0) * 255.0) as u8;
        }
    }
}
