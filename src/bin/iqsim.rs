//! Synthetic BPSK capture generator
//!
//! Writes random BPSK (behind an alternating preamble) with a carrier
//! offset, a static phase offset and optional AWGN to a 2-channel float WAV.
//!
//! Usage:
//!   iqsim [OPTIONS] <output.wav>
//!
//! Options:
//!   -r, --rate <Hz>        Sample rate (default: 1000000)
//!   -b, --baud <Sym/s>     Symbol rate (default: 10000)
//!   -d, --duration <sec>   Capture length (default: 0.005)
//!   -f, --offset <Hz>      Carrier offset (default: 1000)
//!   -p, --phase <deg>      Phase offset (default: 5)
//!   -s, --snr <dB>         Add AWGN at this SNR
//!       --seed <n>         Random seed (default: 1)
//!   -h, --help             Show this help message

use iqsync::simulation::{BpskScenario, SimulatedSource};
use iqsync::{tracing_init, write_iq_wav, IqSource};

struct SimConfig {
    output_path: String,
    scenario: BpskScenario,
    snr_db: Option<f64>,
    seed: u64,
}

fn parse_value<T: std::str::FromStr>(args: &[String], i: usize, what: &str) -> Result<T, String> {
    let raw = args.get(i).ok_or_else(|| format!("Missing value for {}", what))?;
    raw.parse()
        .map_err(|_| format!("Invalid {} value: {}", what, raw))
}

impl SimConfig {
    fn parse_args() -> Result<Self, String> {
        let args: Vec<String> = std::env::args().collect();

        let mut scenario = BpskScenario::default();
        let mut snr_db = None;
        let mut seed = 1;
        let mut output_path = None;

        let mut i = 1;
        while i < args.len() {
            match args[i].as_str() {
                "-r" | "--rate" => {
                    i += 1;
                    scenario.sample_rate = parse_value(&args, i, "--rate")?;
                }
                "-b" | "--baud" => {
                    i += 1;
                    scenario.symbol_rate = parse_value(&args, i, "--baud")?;
                }
                "-d" | "--duration" => {
                    i += 1;
                    scenario.duration = parse_value(&args, i, "--duration")?;
                }
                "-f" | "--offset" => {
                    i += 1;
                    scenario.carrier_offset_hz = parse_value(&args, i, "--offset")?;
                }
                "-p" | "--phase" => {
                    i += 1;
                    scenario.phase_offset_deg = parse_value(&args, i, "--phase")?;
                }
                "-s" | "--snr" => {
                    i += 1;
                    snr_db = Some(parse_value(&args, i, "--snr")?);
                }
                "--seed" => {
                    i += 1;
                    seed = parse_value(&args, i, "--seed")?;
                }
                "-h" | "--help" => {
                    print_help(&args[0]);
                    std::process::exit(0);
                }
                arg if !arg.starts_with('-') => {
                    if output_path.is_none() {
                        output_path = Some(arg.to_string());
                    } else {
                        return Err(format!("Unexpected argument: {}", arg));
                    }
                }
                arg => return Err(format!("Unknown option: {}", arg)),
            }
            i += 1;
        }

        let output_path = output_path.ok_or("Missing output file argument")?;

        Ok(SimConfig {
            output_path,
            scenario,
            snr_db,
            seed,
        })
    }
}

fn print_help(program: &str) {
    eprintln!("Synthetic BPSK I/Q generator");
    eprintln!();
    eprintln!("Usage: {} [OPTIONS] <output.wav>", program);
    eprintln!();
    eprintln!("Options:");
    eprintln!("  -r, --rate <Hz>        Sample rate (default: 1000000)");
    eprintln!("  -b, --baud <Sym/s>     Symbol rate (default: 10000)");
    eprintln!("  -d, --duration <sec>   Capture length (default: 0.005)");
    eprintln!("  -f, --offset <Hz>      Carrier offset (default: 1000)");
    eprintln!("  -p, --phase <deg>      Phase offset (default: 5)");
    eprintln!("  -s, --snr <dB>         Add AWGN at this SNR");
    eprintln!("      --seed <n>         Random seed (default: 1)");
    eprintln!("  -h, --help             Show this help message");
}

fn main() -> Result<(), String> {
    tracing_init::init_tracing();
    let config = SimConfig::parse_args()?;
    let s = &config.scenario;

    println!("BPSK I/Q Simulator");
    println!("==================");
    println!("Sample rate:  {:.0} Hz", s.sample_rate);
    println!("Symbol rate:  {:.0} Sym/s", s.symbol_rate);
    println!("Duration:     {:.6} s", s.duration);
    println!("Offset:       {:.1} Hz", s.carrier_offset_hz);
    println!("Phase:        {:.1} deg", s.phase_offset_deg);
    match config.snr_db {
        Some(snr) => println!("SNR:          {:.1} dB", snr),
        None => println!("SNR:          noiseless"),
    }
    println!();

    let mut source = SimulatedSource::from_scenario(s, config.snr_db, config.seed)
        .map_err(|e| e.to_string())?;
    let capture = source
        .acquire(s.num_samples())
        .map_err(|e| e.to_string())?;

    write_iq_wav(&config.output_path, &capture).map_err(|e| e.to_string())?;
    println!(
        "  ✓ Wrote {} samples ({:.3} ms) to {}",
        capture.len(),
        capture.duration() * 1e3,
        config.output_path
    );

    Ok(())
}
