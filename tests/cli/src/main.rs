use fontsmith::{Modifier, Options, WaterfallSubsetter};
use std::env;
use std::path::Path;

// Note that this is more of an experimental CLI used for testing.
//
// Usage: cli <input> <output> [text] [--upem N] [--mono N]
fn main() {
    env_logger::init();

    let mut args = env::args().skip(1);
    let mut positional = vec![];
    let mut upem = None;
    let mut mono = None;

    while let Some(arg) = args.next() {
        match arg.as_str() {
            "--upem" => upem = args.next().map(|v| v.parse::<u32>().unwrap()),
            "--mono" => mono = args.next().map(|v| v.parse::<u16>().unwrap()),
            _ => positional.push(arg),
        }
    }

    let input = &positional[0];
    let output = positional.get(1).map_or("res.ttf", String::as_str);
    let text = positional.get(2).map_or("Hello", String::as_str);

    let (faces, leftover) = WaterfallSubsetter::new()
        .add_primary(Path::new(input), 0)
        .add_text(text)
        .run_best_effort()
        .unwrap();

    if !leftover.is_empty() {
        log::warn!("{} codepoints are not in {input}", leftover.len());
    }

    let face = faces.first().expect("font covers none of the text");
    let mut modifier = Modifier::new(face, 0, Options::default()).unwrap();
    if let Some(upem) = upem {
        modifier.change_units_per_em(upem).unwrap();
    }
    if let Some(width) = mono {
        modifier.change_make_monospaced(width).unwrap();
    }

    let data = modifier.export_result().unwrap();
    fontsmith::fs::write_bytes(output, &data).unwrap();
}
