//! Fixtures for media tests.

#![allow(dead_code)]

use forge_core::{AudioClip, ImageData, PcmFormat};
use image::{DynamicImage, ImageFormat, Rgba, RgbaImage};
use std::io::Cursor;

/// A solid-colour PNG panel.
pub fn png_panel(width: u32, height: u32, rgb: [u8; 3]) -> ImageData {
    let image = RgbaImage::from_pixel(width, height, Rgba([rgb[0], rgb[1], rgb[2], 255]));
    let mut bytes = Vec::new();
    DynamicImage::ImageRgba8(image)
        .write_to(&mut Cursor::new(&mut bytes), ImageFormat::Png)
        .expect("encode test png");
    ImageData::new("image/png", bytes)
}

/// A clip of `seconds` of constant `value` at `format`.
pub fn clip(panel: usize, seconds: f64, value: f32, format: PcmFormat) -> AudioClip {
    let frames = (seconds * f64::from(format.sample_rate)).round() as usize;
    AudioClip::from_pcm(panel, vec![value; frames * usize::from(format.channels)], format)
}

/// A mono 16-bit WAV file holding a 440 Hz tone.
pub fn wav_tone(sample_rate: u32, seconds: f64) -> Vec<u8> {
    let frames = (seconds * f64::from(sample_rate)) as u32;
    let data_len = frames * 2;
    let mut wav = Vec::with_capacity(44 + data_len as usize);
    wav.extend_from_slice(b"RIFF");
    wav.extend_from_slice(&(36 + data_len).to_le_bytes());
    wav.extend_from_slice(b"WAVEfmt ");
    wav.extend_from_slice(&16u32.to_le_bytes());
    wav.extend_from_slice(&1u16.to_le_bytes());
    wav.extend_from_slice(&1u16.to_le_bytes());
    wav.extend_from_slice(&sample_rate.to_le_bytes());
    wav.extend_from_slice(&(sample_rate * 2).to_le_bytes());
    wav.extend_from_slice(&2u16.to_le_bytes());
    wav.extend_from_slice(&16u16.to_le_bytes());
    wav.extend_from_slice(b"data");
    wav.extend_from_slice(&data_len.to_le_bytes());
    for n in 0..frames {
        let t = f64::from(n) / f64::from(sample_rate);
        let sample = ((t * 440.0 * std::f64::consts::TAU).sin() * 8_000.0) as i16;
        wav.extend_from_slice(&sample.to_le_bytes());
    }
    wav
}

/// Whether `ffmpeg` is available; prints a skip notice when it is not.
pub fn ffmpeg_available() -> bool {
    let available = forge_media::is_ffmpeg_on_path();
    if !available {
        eprintln!("skipping: ffmpeg not found on PATH");
    }
    available
}
