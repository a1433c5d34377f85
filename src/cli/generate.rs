use std::fs::File;
use std::io::{BufWriter, Write};

use anyhow::{Context, Result};
use indicatif::MultiProgress;
use moss::process::encode::Encoder;
use moss::structs::format::FrameFormat;
use moss::structs::hit::{MAX_PIXEL_ADDRESS, MossHit};
use moss::structs::packet::MossPacket;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use super::command::{Cli, GenerateArgs};
use super::progress::create_progress_bar;

pub fn cmd_generate(args: &GenerateArgs, _cli: &Cli, multi: Option<&MultiProgress>) -> Result<()> {
    log::info!(
        "Generating {} frames into {}",
        args.packets,
        args.output.display()
    );

    let pb = match multi {
        Some(multi) => Some(create_progress_bar(multi, None)?),
        None => None,
    };

    let stream = generate_stream(args)?;

    let file = File::create(&args.output)
        .with_context(|| format!("Failed to create {}", args.output.display()))?;
    let mut writer = BufWriter::new(file);
    writer.write_all(&stream.bytes)?;
    writer.flush()?;

    if let Some(pb) = pb {
        pb.set_position(stream.bytes.len() as u64);
        pb.finish_with_message(format!("{} packets", stream.packets.len()));
    }

    log::info!(
        "Wrote {} bytes: {} frames, {} hits, {} noise bytes, {} tail bytes",
        stream.bytes.len(),
        stream.packets.len(),
        stream.packets.iter().map(|p| p.hits().len()).sum::<usize>(),
        stream.noise_bytes,
        stream.tail_bytes
    );

    Ok(())
}

/// A synthetic readout stream and the packets encoded in it.
#[derive(Debug)]
pub struct GeneratedStream {
    pub bytes: Vec<u8>,
    pub packets: Vec<MossPacket>,
    pub noise_bytes: usize,
    pub tail_bytes: usize,
}

pub fn generate_stream(args: &GenerateArgs) -> Result<GeneratedStream> {
    let format = FrameFormat::MOSS_V1;
    let mut rng = StdRng::seed_from_u64(args.seed);
    let mut encoder = Encoder::new(format)?;

    let mut stream = GeneratedStream {
        bytes: Vec::new(),
        packets: Vec::with_capacity(args.packets),
        noise_bytes: 0,
        tail_bytes: 0,
    };

    for i in 0..args.packets {
        let packet = random_packet(&mut rng, &format, args.max_hits)?;
        encoder.set_region_padding(rng.gen_range(0..=2));
        encoder.encode(&packet, &mut stream.bytes)?;
        stream.packets.push(packet);

        if args.noise_every > 0 && (i + 1) % args.noise_every == 0 {
            for _ in 0..rng.gen_range(1..=4) {
                stream.bytes.push(noise_byte(&mut rng, &format));
                stream.noise_bytes += 1;
            }
        }
    }

    if args.tail > 0 {
        let packet = random_packet(&mut rng, &format, args.max_hits)?;
        let mut frame = Vec::new();
        encoder.encode(&packet, &mut frame)?;

        // Never include the trailer, the frame must stay open.
        let tail = args.tail.min(frame.len() - 1);
        stream.bytes.extend_from_slice(&frame[..tail]);
        stream.tail_bytes = tail;
    }

    Ok(stream)
}

fn random_packet(rng: &mut StdRng, format: &FrameFormat, max_hits: usize) -> Result<MossPacket> {
    let unit_id = rng.gen_range(0..=format.unit_header.max_id);
    let mut hits: Vec<MossHit> = (0..rng.gen_range(0..=max_hits))
        .map(|_| {
            MossHit::new(
                rng.gen_range(0..format.regions()),
                rng.gen_range(0..=MAX_PIXEL_ADDRESS),
                rng.gen_range(0..=MAX_PIXEL_ADDRESS),
            )
        })
        .collect();
    hits.sort_by_key(|hit| hit.region);

    Ok(MossPacket::with_format(unit_id, hits, format)?)
}

/// A byte that neither opens nor closes a frame.
fn noise_byte(rng: &mut StdRng, format: &FrameFormat) -> u8 {
    loop {
        let byte: u8 = rng.r#gen();
        if byte != format.trailer && format.unit_header.id_of(byte).is_none() {
            return byte;
        }
    }
}
