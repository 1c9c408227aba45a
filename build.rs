use std::env;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

fn main() {
    codegen_special_forms();
    codegen_hash_literals();
}

fn codegen_special_forms() {
    let path = Path::new(&env::var("OUT_DIR").unwrap()).join("special_forms.rs");
    let mut file = BufWriter::new(File::create(&path).unwrap());

    writeln!(
        &mut file,
        "static SPECIAL_FORMS: phf::Map<&'static str, SpecialForm> = {};",
        phf_codegen::Map::new()
            .entry("and", "SpecialForm::And")
            .entry("or", "SpecialForm::Or")
            .entry("if", "SpecialForm::If")
            .entry("cond", "SpecialForm::Cond")
            .entry("begin", "SpecialForm::Begin")
            .entry("lambda", "SpecialForm::Lambda")
            .entry("mu", "SpecialForm::Mu")
            .entry("define", "SpecialForm::Define")
            .entry("quote", "SpecialForm::Quote")
            .entry("let", "SpecialForm::Let")
            .build()
    )
    .unwrap();
}

fn codegen_hash_literals() {
    let path = Path::new(&env::var("OUT_DIR").unwrap()).join("hash_literals.rs");
    let mut file = BufWriter::new(File::create(&path).unwrap());

    writeln!(
        &mut file,
        "static HASH_LITERALS: phf::Map<&'static str, bool> = {};",
        phf_codegen::Map::new()
            .entry("t", "true")
            .entry("f", "false")
            .entry("true", "true")
            .entry("false", "false")
            .build()
    )
    .unwrap();
}
