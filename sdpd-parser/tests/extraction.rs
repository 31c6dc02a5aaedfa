//! End-to-end extraction tests: PNG bytes in, `sd` command line out.

use rstest::rstest;
use sdpd_parser::testing::{sd_png, PngBuilder};
use sdpd_parser::{extract_command, ExtractError, FieldRegistry, Metadata, RenderOptions};
use std::io::Cursor;
use std::path::PathBuf;

const CAT: &str = "a cat, steps: 20\nNegative prompt: ugly\nSteps: 20, Seed: 5, Size: 512x768";

const FULL: &str = "masterpiece, a lighthouse at dusk\n\
Negative prompt: blurry, lowres\n\
Steps: 30, CFG scale: 7.5, Guidance: 3.5, Seed: 1234, Size: 768x512, \
Model: dreamshaper_8.safetensors, RNG: cuda, Sampler: euler_a, Version: stable-diffusion.cpp";

fn run(parameters: &str, options: &RenderOptions) -> String {
    let registry = FieldRegistry::standard().expect("standard registry");
    extract_command(&mut Cursor::new(sd_png(parameters)), &registry, options)
        .expect("extraction to succeed")
}

#[test]
fn renders_long_switches() {
    let line = run(CAT, &RenderOptions::default());
    insta::assert_snapshot!(line, @r#"sd --prompt "a cat, steps: 20" --negative-prompt "ugly" --steps 20 --seed 5 --width 512 --height 768 --color --output <REPLACE_ME>"#);
}

#[test]
fn renders_abbreviated_switches() {
    let line = run(CAT, &RenderOptions::default().abbreviated(true));
    insta::assert_snapshot!(line, @r#"sd -p "a cat, steps: 20" -n "ugly" --steps 20 -s 5 -W 512 -H 768 --color -o <REPLACE_ME>"#);
}

#[test]
fn renders_every_standard_field() {
    let options = RenderOptions {
        model_dir: Some(PathBuf::from("/models")),
        vae_path: Some(PathBuf::from("/models/vae/ft-mse.safetensors")),
        ..RenderOptions::default()
    };
    let line = run(FULL, &options);
    insta::assert_snapshot!(line, @r#"sd --prompt "masterpiece, a lighthouse at dusk" --negative-prompt "blurry, lowres" --steps 30 --cfg-scale 7.5 --seed 1234 --width 768 --height 512 --model /models/dreamshaper_8.safetensors --rng cuda --sampling-method euler_a --vae "/models/vae/ft-mse.safetensors" --color --output <REPLACE_ME>"#);
}

#[test]
fn abbreviation_falls_back_to_long_form() {
    let line = run(FULL, &RenderOptions::default().abbreviated(true));
    assert!(line.contains("--cfg-scale 7.5"));
    assert!(line.contains("--sampling-method euler_a"));
    assert!(line.contains("-m dreamshaper_8.safetensors"));
    assert!(line.ends_with("-o <REPLACE_ME>"));
}

#[test]
fn oversized_label_is_skipped() {
    let long_label = "X".repeat(80);
    let parameters = format!("a cat\n{long_label}: nope\nSteps: 3");
    let line = run(&parameters, &RenderOptions::default());

    assert!(!line.contains("nope"));
    assert_eq!(
        line,
        "sd --prompt \"a cat\" --steps 3 --color --output <REPLACE_ME>"
    );
}

#[rstest]
#[case::no_negative_prompt("a dog\nSteps: 4, Seed: 7", "sd --prompt \"a dog\" --steps 4 --seed 7")]
#[case::prompt_only("just a prompt", "sd --prompt \"just a prompt\"")]
#[case::empty_prompt("", "sd --prompt \"\"")]
#[case::unknown_settings("x\nSteps: 1, Clip skip: 2, Seed: 3", "sd --prompt \"x\" --steps 1 --seed 3")]
fn renders_partial_metadata(#[case] parameters: &str, #[case] head: &str) {
    let line = run(parameters, &RenderOptions::default());
    assert_eq!(line, format!("{head} --color --output <REPLACE_ME>"));
}

#[test]
fn finds_text_after_other_chunks() {
    let png = PngBuilder::new()
        .ihdr(64, 64)
        .chunk(*b"gAMA", &[0, 0, 177, 143])
        .chunk(*b"IDAT", &[0x78; 300])
        .text("parameters", "late text\nSteps: 2")
        .iend()
        .build();
    let metadata = Metadata::from_reader(&mut Cursor::new(png)).unwrap();
    let registry = FieldRegistry::standard().unwrap();

    assert_eq!(
        metadata.render(&registry, &RenderOptions::default()),
        "sd --prompt \"late text\" --steps 2 --color --output <REPLACE_ME>"
    );
}

#[test]
fn png_without_metadata_fails() {
    let png = PngBuilder::new().ihdr(1, 1).iend().build();
    let err = Metadata::from_reader(&mut Cursor::new(png)).unwrap_err();
    assert_eq!(err.to_string(), "unable to find tEXt chunk");
}

#[test]
fn non_png_fails() {
    let err = Metadata::from_reader(&mut Cursor::new(b"\x89PNX\r\n\x1a\n".to_vec())).unwrap_err();
    assert!(matches!(err, ExtractError::Png(_)));
}
