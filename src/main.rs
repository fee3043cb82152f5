use clap::{Parser, ValueEnum};
use signal_hook::consts::signal::{SIGINT, SIGTERM};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use metrology_rms::generate_signal::{SignalGenerator, WaveProfile, F};
use metrology_rms::print;
use metrology_rms::{
    AdcResolution, AverageMeter, AverageOutputs, BiasRestore, ConfigError, Meter, PowerMeter,
    PowerOutputs, RmsMeter, RmsOutputs, ScanMode, SharedMeter, SplitPowerMeter, StdClock,
    TimeSource,
};

#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
enum MeterKind {
    /// Average of the voltage channel
    Average,
    /// True RMS of the voltage channel
    Rms,
    /// Voltage/current power meter, one call per sample pair
    Power,
    /// Voltage/current power meter fed in two phases
    Split,
}

/// True RMS metering over a synthetic ADC stream
#[derive(Parser, Debug)]
#[command(
    author,
    version,
    about = "True RMS metering over a synthetic ADC stream",
    long_about = None
)]
struct Args {
    /// Meter to run
    #[arg(short, long, value_enum, default_value_t = MeterKind::Power)]
    meter: MeterKind,

    /// Samples per window (1-255)
    #[arg(short, long, default_value_t = 160)]
    window: u8,

    /// ADC resolution in bits (8, 10 or 12)
    #[arg(short, long, default_value_t = 10)]
    bits: u8,

    /// Enable DC baseline restoration
    #[arg(long)]
    blr: bool,

    /// Single-scan mode, restarted after every publish
    #[arg(long)]
    single: bool,

    /// Sample rate in Hz
    #[arg(long, default_value_t = 4000.0)]
    rate_hz: f64,

    /// Run time in seconds, 0 runs until SIGINT
    #[arg(long, default_value_t = 5.0)]
    seconds: f64,

    /// Full-scale voltage range
    #[arg(long, default_value_t = 800.0)]
    range_v: f64,

    /// Full-scale current range
    #[arg(long, default_value_t = 20.0)]
    range_a: f64,

    /// Sine amplitude in counts
    #[arg(long, default_value_t = 300.0)]
    amplitude: f64,

    /// DC offset from mid-scale in counts
    #[arg(long, default_value_t = 0.0, allow_negative_numbers = true)]
    offset: f64,

    /// Current phase shift in degrees
    #[arg(long, default_value_t = 30.0, allow_negative_numbers = true)]
    phase_deg: f64,

    /// Peak of uniform noise in counts
    #[arg(long, default_value_t = 0.0)]
    noise: f64,

    /// Publishes between reports
    #[arg(long, default_value_t = 10)]
    report_every: u32,
}

enum AnyMeter {
    Average(AverageMeter),
    Rms(RmsMeter),
    Power(PowerMeter),
    Split(SplitPowerMeter),
}

#[derive(Debug, Clone, Copy)]
enum Report {
    Average(AverageOutputs),
    Rms(RmsOutputs),
    Power(PowerOutputs),
}

impl AnyMeter {
    fn configure(args: &Args) -> Result<Self, ConfigError> {
        let resolution = AdcResolution::from_bits(args.bits)?;
        let bias = BiasRestore::from(args.blr);
        let mode = if args.single { ScanMode::Single } else { ScanMode::Continuous };

        let meter = match args.meter {
            MeterKind::Average => {
                let mut m = AverageMeter::new();
                m.begin(args.range_v, args.window, resolution, mode)?;
                AnyMeter::Average(m)
            }
            MeterKind::Rms => {
                let mut m = RmsMeter::deferred();
                m.begin(args.range_v, args.window, resolution, bias, mode)?;
                AnyMeter::Rms(m)
            }
            MeterKind::Power => {
                let mut m = PowerMeter::new();
                m.begin(args.range_v, args.range_a, args.window, resolution, bias, mode)?;
                AnyMeter::Power(m)
            }
            MeterKind::Split => {
                let mut m = SplitPowerMeter::new();
                m.begin(args.range_v, args.range_a, args.window, resolution, bias, mode)?;
                AnyMeter::Split(m)
            }
        };
        Ok(meter)
    }

    fn control(&mut self) -> &mut dyn Meter {
        match self {
            AnyMeter::Average(m) => m,
            AnyMeter::Rms(m) => m,
            AnyMeter::Power(m) => m,
            AnyMeter::Split(m) => m,
        }
    }

    #[inline]
    fn feed(&mut self, voltage: u16, current: u16) {
        match self {
            AnyMeter::Average(m) => {
                m.update(voltage);
            }
            AnyMeter::Rms(m) => {
                m.update(voltage);
            }
            AnyMeter::Power(m) => {
                m.update(voltage, current);
            }
            AnyMeter::Split(m) => {
                m.update_phase_a(voltage);
                m.update_phase_b(current);
            }
        }
    }

    fn publish<T: TimeSource>(&mut self, clock: &T) -> Report {
        match self {
            AnyMeter::Average(m) => Report::Average(*m.publish()),
            AnyMeter::Rms(m) => Report::Rms(*m.publish()),
            AnyMeter::Power(m) => Report::Power(*m.publish(clock)),
            AnyMeter::Split(m) => Report::Power(*m.publish(clock)),
        }
    }
}

fn print_report(report: &Report) {
    match report {
        Report::Average(out) => print::print_average(out, "V"),
        Report::Rms(out) => print::print_rms(out, "V"),
        Report::Power(out) => {
            print::print_power(out);
            print::print_energy(out);
        }
    }
}

/*
* @brief Turn the run time and sample rate arguments into durations.
* @param seconds Run time, 0 for no limit.
* @param rate_hz Sample rate.
* @return Optional run limit and the sampling period.
* @note Rejects values a Duration cannot hold (infinite, NaN or too large).
*/
fn run_limits(seconds: f64, rate_hz: f64) -> Result<(Option<Duration>, Duration), String> {
    if !(rate_hz > 0.0) {
        return Err(format!("sample rate must be positive, got {}", rate_hz));
    }
    let period = Duration::try_from_secs_f64(1.0 / rate_hz)
        .map_err(|e| format!("sample rate {} Hz: {}", rate_hz, e))?;

    let run_for = (seconds > 0.0)
        .then(|| Duration::try_from_secs_f64(seconds))
        .transpose()
        .map_err(|e| format!("run time {} s: {}", seconds, e))?;

    Ok((run_for, period))
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::init();

    let args = Args::parse();
    let (run_for, period) = run_limits(args.seconds, args.rate_hz)?;

    let shared = Arc::new(SharedMeter::new(AnyMeter::configure(&args)?));
    let resolution = AdcResolution::from_bits(args.bits)?;

    let terminate = Arc::new(AtomicBool::new(false));
    signal_hook::flag::register(SIGINT, Arc::clone(&terminate))?;
    signal_hook::flag::register(SIGTERM, Arc::clone(&terminate))?;

    let voltage = WaveProfile {
        amplitude: args.amplitude,
        dc_offset: args.offset,
        phase_deg: 0.0,
        noise: args.noise,
    };
    let current = WaveProfile {
        phase_deg: -args.phase_deg,
        ..voltage
    };
    let mut generator = SignalGenerator::new(resolution, args.rate_hz, F, voltage, current);

    log::info!(
        "Running {:?} meter: W={}, {} bits, BLR {}, {} scan, {:.1} samples per cycle",
        args.meter,
        args.window,
        args.bits,
        if args.blr { "on" } else { "off" },
        if args.single { "single" } else { "continuous" },
        generator.samples_per_cycle()
    );

    shared.with(|m| m.control().start());

    // Sampling thread, stands in for the ADC interrupt
    let sampler = thread::spawn({
        let shared = Arc::clone(&shared);
        let terminate = Arc::clone(&terminate);

        move || {
            let mut rng = rand::thread_rng();
            let started = Instant::now();
            let mut next = started;

            while !terminate.load(Ordering::Relaxed) {
                if run_for.is_some_and(|limit| started.elapsed() >= limit) {
                    terminate.store(true, Ordering::Relaxed);
                    break;
                }

                let (v, i) = generator.next_pair(&mut rng);
                shared.with(|m| m.feed(v, i));

                next += period;
                let now = Instant::now();
                if next > now {
                    spin_sleep::sleep(next - now);
                }
            }
        }
    });

    // Consumer: publish every completed window
    let clock = StdClock::new();
    let mut publishes: u32 = 0;
    while !terminate.load(Ordering::Relaxed) {
        let report = shared.with(|m| {
            if !m.control().is_ready() {
                return None;
            }
            let report = m.publish(&clock);
            if args.single {
                m.control().start();
            }
            Some(report)
        });

        match report {
            Some(report) => {
                publishes = publishes.wrapping_add(1);
                if args.report_every > 0 && publishes % args.report_every == 0 {
                    print_report(&report);
                }
            }
            None => thread::sleep(Duration::from_millis(1)),
        }
    }

    if sampler.join().is_err() {
        log::error!("Sampling thread panicked");
    }

    shared.with(|m| m.control().stop());
    log::info!("Stopped after {} publishes", publishes);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn run_limits_for_a_normal_run() {
        let (run_for, period) = run_limits(2.5, 4000.0).unwrap();
        assert_eq!(run_for, Some(Duration::from_millis(2500)));
        assert_eq!(period, Duration::from_micros(250));
    }

    #[test]
    fn zero_seconds_runs_without_limit() {
        let (run_for, _) = run_limits(0.0, 1000.0).unwrap();
        assert_eq!(run_for, None);
        assert_eq!(run_limits(f64::NAN, 1000.0).unwrap().0, None);
    }

    #[test]
    fn unrepresentable_run_time_is_an_error() {
        assert!(run_limits(f64::INFINITY, 1000.0).is_err());
        assert!(run_limits(1e30, 1000.0).is_err());
    }

    #[test]
    fn bad_sample_rate_is_an_error() {
        assert!(run_limits(1.0, 0.0).is_err());
        assert!(run_limits(1.0, -5.0).is_err());
        assert!(run_limits(1.0, f64::NAN).is_err());
        // Period overflows a Duration
        assert!(run_limits(1.0, 1e-320).is_err());
    }
}
