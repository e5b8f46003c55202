//! OOK48 Signal Simulator
//!
//! Generate a keyed OOK48 transmission as a WAV file, one character per
//! second (8 symbols at 9 baud plus the idle ninth), optionally buried in
//! Gaussian noise.
//!
//! Usage:
//!   cargo run --bin ook48sim -- [OPTIONS] <message> <output.wav>
//!
//! Options:
//!   -a, --amplitude <0..1>   Tone amplitude (default: 0.5)
//!   -n, --noise <sigma>      Add Gaussian noise with the given sigma
//!   -h, --help               Show this help message
//!
//! Examples:
//!   # Clean keying
//!   ook48sim "CQ TEST" clean.wav
//!
//!   # Weak signal in noise
//!   ook48sim -a 0.05 -n 0.2 "CQ TEST" weak.wav

use rustyook48::constants::OOK48;
use rustyook48::ook48::compile_message;
use rustyook48::simulation::{bin_frequency, keyed_waveform, white_noise};
use rustyook48::tracing_init;

struct SimConfig {
    message: String,
    output_path: String,
    amplitude: f32,
    noise_sigma: Option<f32>,
}

impl SimConfig {
    fn parse_args() -> Result<Self, String> {
        let args: Vec<String> = std::env::args().collect();

        let mut amplitude = 0.5f32;
        let mut noise_sigma = None;
        let mut message = None;
        let mut output_path = None;

        let mut i = 1;
        while i < args.len() {
            match args[i].as_str() {
                "-a" | "--amplitude" => {
                    i += 1;
                    let value = args.get(i).ok_or("Missing value for --amplitude")?;
                    amplitude = value
                        .parse()
                        .map_err(|_| format!("Invalid amplitude: {}", value))?;
                }
                "-n" | "--noise" => {
                    i += 1;
                    let value = args.get(i).ok_or("Missing value for --noise")?;
                    noise_sigma = Some(
                        value
                            .parse()
                            .map_err(|_| format!("Invalid noise sigma: {}", value))?,
                    );
                }
                "-h" | "--help" => {
                    print_help(&args[0]);
                    std::process::exit(0);
                }
                arg if !arg.starts_with('-') => {
                    if message.is_none() {
                        message = Some(arg.to_string());
                    } else if output_path.is_none() {
                        output_path = Some(arg.to_string());
                    } else {
                        return Err(format!("Unexpected argument: {}", arg));
                    }
                }
                arg => return Err(format!("Unknown option: {}", arg)),
            }
            i += 1;
        }

        Ok(SimConfig {
            message: message.ok_or("Missing message argument")?,
            output_path: output_path.ok_or("Missing output file argument")?,
            amplitude,
            noise_sigma,
        })
    }
}

fn print_help(program: &str) {
    eprintln!("OOK48 Signal Simulator");
    eprintln!();
    eprintln!("Usage: {} [OPTIONS] <message> <output.wav>", program);
    eprintln!();
    eprintln!("Options:");
    eprintln!("  -a, --amplitude <0..1>   Tone amplitude (default: 0.5)");
    eprintln!("  -n, --noise <sigma>      Add Gaussian noise");
}

fn main() {
    tracing_init::init_tracing();

    let config = match SimConfig::parse_args() {
        Ok(config) => config,
        Err(reason) => {
            eprintln!("Error: {}", reason);
            std::process::exit(1);
        }
    };

    let bytes = compile_message(&config.message, "");
    eprintln!(
        "Keying {} characters at 9 baud, tone {:.0} Hz",
        bytes.len(),
        bin_frequency(&OOK48, OOK48.tone0)
    );

    // One second per character: 8 data symbols, then the idle ninth
    let mut bits = Vec::with_capacity(bytes.len() * 9);
    for byte in &bytes {
        for bit in 0..8 {
            bits.push(byte & (0x80 >> bit) != 0);
        }
        bits.push(false);
    }

    let mut samples = keyed_waveform(
        &bits,
        OOK48.num_samples,
        bin_frequency(&OOK48, OOK48.tone0),
        OOK48.sample_rate as f32,
        config.amplitude,
    );
    if let Some(sigma) = config.noise_sigma {
        let mut rng = rand::rng();
        let noise = white_noise(samples.len(), sigma, &mut rng);
        for (sample, n) in samples.iter_mut().zip(noise) {
            *sample = (*sample + n).clamp(-1.0, 1.0);
        }
    }

    let spec = hound::WavSpec {
        channels: 1,
        sample_rate: OOK48.sample_rate,
        bits_per_sample: 16,
        sample_format: hound::SampleFormat::Int,
    };
    let mut writer = match hound::WavWriter::create(&config.output_path, spec) {
        Ok(writer) => writer,
        Err(reason) => {
            eprintln!("Error creating {}: {}", config.output_path, reason);
            std::process::exit(1);
        }
    };
    for sample in samples {
        writer
            .write_sample((sample * 32767.0) as i16)
            .expect("write sample");
    }
    writer.finalize().expect("finalize wav");
    eprintln!("Wrote {}", config.output_path);
}
