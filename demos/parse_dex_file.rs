#![allow(unused)]

use dexrs::Result;

fn parse_dex_file(path: &str) -> Result<()> {
    // the parser takes a plain byte slice; callers decide how to get one (read the whole file,
    // mmap it, slice an already-loaded archive entry, ...).
    let bytes = std::fs::read(path).map_err(dexrs::error::DexError::Io)?;
    let file = dexrs::parse(&bytes)?;

    for class in &file.classes {
        if class.is_external() {
            continue;
        }
        let name = file.string_at(class.descriptor).unwrap_or("<unknown>");
        println!("{name}: {} fields, {} methods", class.fields.len(), class.methods.len());

        for &method_idx in &class.methods {
            let method = file.method_at(method_idx).expect("valid method index");
            let method_name = file.string_at(method.name).unwrap_or("<unknown>");
            if method.access_flags.is_constructor() {
                println!("  <ctor> {method_name}");
            } else {
                println!("  {method_name}");
            }
        }
    }

    Ok(())
}

fn main() {
    // ...
}
