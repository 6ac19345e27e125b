mod codegen;
mod error;
mod grammar;
mod label;
mod parser;

use std::fs;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use color_print::cprintln;

use crate::error::Error;
use crate::grammar::Stmt;

const HELP_TEMPLATE: &str = "\
{before-help}{bin} {version}
  {about}

{usage-heading}
{tab}{usage}

{all-args}{after-help}";

#[derive(Debug, clap::Parser)]
#[clap(version, about = "Assembler for the DG16 architecture", help_template = HELP_TEMPLATE)]
struct Args {
    /// Input assembly file
    input: String,

    /// Output file (defaults to the input with the format's suffix)
    #[clap(short, long)]
    output: Option<String>,

    /// Output format
    #[clap(short, long, value_enum, default_value_t = OutFormat::Bytes)]
    format: OutFormat,

    /// Write zero lines for odd addresses
    #[clap(short, long)]
    skip_odd: bool,

    /// Print the assembled listing
    #[clap(short, long)]
    dump: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
enum OutFormat {
    /// One 16-bit word per line, hex
    Words,
    /// One byte per line, hex, high byte first
    Bytes,
    /// One 16-bit word per line, binary digits
    Binary,
}

impl OutFormat {
    fn suffix(self) -> &'static str {
        match self {
            OutFormat::Binary => "txt",
            OutFormat::Words | OutFormat::Bytes => "hex",
        }
    }
}

fn main() -> ExitCode {
    use clap::Parser;
    let args = Args::parse();

    let src = match fs::read_to_string(&args.input) {
        Ok(src) => src,
        Err(err) => {
            Error::FileRead(args.input.clone(), err).report(&args.input, "");
            return ExitCode::FAILURE;
        }
    };

    let stmts = match grammar::parse_asm(&src) {
        Ok(stmts) => stmts,
        Err(fail) => {
            Error::Syntax(fail).report(&args.input, &src);
            return ExitCode::FAILURE;
        }
    };

    let words = match codegen::assemble(&stmts) {
        Ok(words) => words,
        Err(err) => {
            err.report(&args.input, &src);
            return ExitCode::FAILURE;
        }
    };

    if args.dump {
        dump(&stmts, &words);
    }

    let out_path = match &args.output {
        Some(path) => PathBuf::from(path),
        None => Path::new(&args.input).with_extension(args.format.suffix()),
    };
    if let Err(err) = write_output(&out_path, &words, args.format, args.skip_odd) {
        err.report(&args.input, &src);
        return ExitCode::FAILURE;
    }
    ExitCode::SUCCESS
}

fn write_output(path: &Path, words: &[u16], format: OutFormat, skip_odd: bool) -> Result<(), Error> {
    let text = render_output(words, format, skip_odd);
    fs::write(path, text).map_err(|err| Error::FileWrite(path.display().to_string(), err))
}

fn render_output(words: &[u16], format: OutFormat, skip_odd: bool) -> String {
    let mut out = String::new();
    match format {
        OutFormat::Bytes => {
            // header required for the Digital simulator to recognize a hex file
            out.push_str("v2.0 raw\n");
            for word in words {
                let [hi, lo] = word.to_be_bytes();
                if skip_odd {
                    out.push_str(&format!("{hi:02x}\n00\n{lo:02x}\n00\n"));
                } else {
                    out.push_str(&format!("{hi:02x}\n{lo:02x}\n"));
                }
            }
        }
        OutFormat::Words => {
            out.push_str("v2.0 raw\n");
            for word in words {
                out.push_str(&format!("{word:04x}\n"));
                if skip_odd {
                    out.push_str("0000\n");
                }
            }
        }
        OutFormat::Binary => {
            for word in words {
                out.push_str(&format!("{word:016b}\n"));
                if skip_odd {
                    out.push_str(&format!("{:016b}\n", 0));
                }
            }
        }
    }
    out
}

/// Side-by-side listing of addresses, encoded words, and source statements.
fn dump(stmts: &[Stmt], words: &[u16]) {
    if let Ok(labels) = codegen::collect_labels(stmts) {
        if !labels.is_empty() {
            cprintln!("<bold>{} label(s)</>", labels.len());
            for (label, addr) in labels.iter() {
                cprintln!("  <green>{:04X}</> {}", addr, label);
            }
        }
    }
    let mut next = words.iter();
    let mut addr: u16 = 0;
    for stmt in stmts {
        match stmt {
            Stmt::Label(label) => cprintln!("     | <green>{}:</>", label),
            Stmt::Inst(inst) => {
                if let Some(word) = next.next() {
                    let args = inst
                        .args
                        .iter()
                        .map(|arg| arg.to_string())
                        .collect::<Vec<_>>()
                        .join(", ");
                    cprintln!(
                        "<green>{:04X}</> | <yellow>{:04X}</>  <red>{:<5}</> <blue>{}</>",
                        addr,
                        word,
                        inst.def.mnemonic,
                        args
                    );
                    addr += arch::isa::ADDR_STEP;
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assembled(src: &str) -> Vec<u16> {
        codegen::assemble(&grammar::parse_asm(src).unwrap()).unwrap()
    }

    #[test]
    fn bytes_format_splits_words_high_byte_first() {
        let words = assembled("add $s1, $s2, $s3");
        assert_eq!(render_output(&words, OutFormat::Bytes, false), "v2.0 raw\n0e\n20\n");
    }

    #[test]
    fn skip_odd_interleaves_zeros() {
        let words = assembled("nop");
        assert_eq!(render_output(&words, OutFormat::Bytes, true), "v2.0 raw\ne0\n00\n00\n00\n");
        assert_eq!(render_output(&words, OutFormat::Words, true), "v2.0 raw\ne000\n0000\n");
    }

    #[test]
    fn words_and_binary_formats() {
        let words = assembled("nop\nhalt");
        assert_eq!(render_output(&words, OutFormat::Words, false), "v2.0 raw\ne000\ne000\n");
        assert_eq!(
            render_output(&words, OutFormat::Binary, false),
            "1110000000000000\n1110000000000000\n"
        );
    }

    #[test]
    fn default_suffix_follows_the_format() {
        assert_eq!(OutFormat::Bytes.suffix(), "hex");
        assert_eq!(OutFormat::Words.suffix(), "hex");
        assert_eq!(OutFormat::Binary.suffix(), "txt");
    }
}
