//! Parse configuration block utility
//! Decodes a saved configuration block and shows every field with its position

use std::env;
use std::fs;
use x1c3_rs::record::layout::{self, describe, Segment};
use x1c3_rs::record::{self, FieldId, RawRecord};

fn main() -> anyhow::Result<()> {
    // Parse command line arguments
    let args: Vec<String> = env::args().collect();
    if args.len() < 2 {
        eprintln!("Usage: {} <record_file> [field name]", args[0]);
        eprintln!("\nExamples:");
        eprintln!("  {} tracker.sav               # Show all fields", args[0]);
        eprintln!("  {} tracker.sav CALLSIGN      # Show one field", args[0]);
        eprintln!("  {} tracker.sav raw           # Hex dump only", args[0]);
        std::process::exit(1);
    }

    let record_file = &args[1];
    let filter = args.get(2).map(|s| s.as_str());

    println!("Reading record file: {}", record_file);
    let raw = RawRecord::new(fs::read(record_file)?);
    println!("Loaded {} bytes\n", raw.len());

    if filter == Some("raw") {
        println!("{}", raw.printable());
        return Ok(());
    }

    let decoded = record::parse(&raw)?;
    layout::verify()?;

    match filter {
        None => {
            println!("=== Layout ===\n");
            for segment in layout::segments() {
                match segment {
                    Segment::Field(spec) => print_field(&raw, &decoded.model, spec.id),
                    Segment::Literal(literal) => println!(
                        "{:>3}..{:<3} {:<20} {:?}",
                        literal.offset,
                        literal.end(),
                        "(literal)",
                        String::from_utf8_lossy(literal.bytes)
                    ),
                }
            }
        }
        Some(name) => {
            let id = FieldId::from_name(name)
                .ok_or_else(|| anyhow::anyhow!("Unknown field {:?}", name))?;
            print_field(&raw, &decoded.model, id);
        }
    }

    if decoded.is_partial() {
        println!("\nUndecodable fields:");
        for id in &decoded.skipped {
            println!("  {}", id);
        }
    }

    Ok(())
}

fn print_field(raw: &RawRecord, model: &record::ConfigModel, id: FieldId) {
    let Some(spec) = layout::spec(id) else {
        println!("{}: not in layout", id);
        return;
    };

    let bytes = raw.get(spec.offset, spec.width).unwrap_or_default();
    let hex: Vec<String> = bytes.iter().map(|b| format!("{:02X}", b)).collect();
    let value = model
        .get(id)
        .map(|v| describe(id, &v))
        .unwrap_or_else(|| "<undecodable>".to_string());

    println!(
        "{:>3}..{:<3} {:<20} {:<24} [{}]",
        spec.offset,
        spec.end(),
        spec.name(),
        value,
        hex.join(" ")
    );
}
