//! The DG16 assembly grammar, composed from the combinators in [`crate::parser`]
//! and driven by the descriptor tables in [`arch::isa`].

use std::fmt;

use arch::isa::{self, InstDef};
use arch::reg::Reg;

use crate::label::Label;
use crate::parser::{
    boxed, choice, identifier, left, literal, literal_exact, map, number, opt, padding, pair,
    parse_all, right, whitespace, wrap_padding, Fail, PResult, Parser, Pos,
};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Operand {
    Reg(Reg),
    Imm(i32),
    Label(Label),
}

impl fmt::Display for Operand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Operand::Reg(reg) => write!(f, "{reg}"),
            Operand::Imm(imm) => write!(f, "{imm}"),
            Operand::Label(label) => write!(f, "{label}"),
        }
    }
}

/// An instruction application: a descriptor plus its operands in the order
/// the encoder expects (rd, rs, rt for R formats; rt, rs, imm for I formats).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Inst {
    pub def: &'static InstDef,
    pub args: Vec<Operand>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Stmt {
    Label(Label),
    Inst(Inst),
}

/// One of the register names, in table order.
fn register<'s>() -> impl Parser<'s, Reg> {
    let arms = Reg::all().map(|reg| boxed(map(literal(reg.name()), move |_| reg))).collect();
    choice(arms, "register")
}

/// One of the mnemonics of `table`, mapped to its descriptor.
fn mnemonic<'s>(table: &'static [InstDef]) -> impl Parser<'s, &'static InstDef> {
    let arms = table.iter().map(|def| boxed(map(literal(def.mnemonic), move |_| def))).collect();
    choice(arms, "mnemonic")
}

/// An identifier that is not a mnemonic or register name.
fn label_name<'s>(src: &'s str, at: Pos) -> PResult<&'s str> {
    let (name, next) = identifier(src, at)?;
    if isa::is_reserved(name) {
        return Err(Fail::new(at, format!("label (`{name}` is a reserved word)")));
    }
    Ok((name, next))
}

fn comma<'s>() -> impl Parser<'s, &'static str> {
    wrap_padding(literal_exact(","))
}

fn imm_or_label<'s>() -> impl Parser<'s, Operand> {
    choice(
        vec![
            boxed(map(number, Operand::Imm)),
            boxed(map(label_name, |name: &str| Operand::Label(Label::new(name)))),
        ],
        "immediate or label",
    )
}

fn r_type<'s>() -> impl Parser<'s, Stmt> {
    let operands = pair(
        right(whitespace, register()),
        pair(right(comma(), register()), right(comma(), register())),
    );
    map(pair(mnemonic(isa::R_TYPE), operands), |(def, (rd, (rs, rt)))| {
        Stmt::Inst(Inst {
            def,
            args: vec![Operand::Reg(rd), Operand::Reg(rs), Operand::Reg(rt)],
        })
    })
}

/// Two-operand R line; the missing rt is the zero register, so the same
/// three-operand encoder serves both forms.
fn reduced_r_type<'s>() -> impl Parser<'s, Stmt> {
    let operands = pair(right(whitespace, register()), right(comma(), register()));
    map(pair(mnemonic(isa::REDUCED_R_TYPE), operands), |(def, (rd, rs))| {
        Stmt::Inst(Inst {
            def,
            args: vec![Operand::Reg(rd), Operand::Reg(rs), Operand::Reg(Reg::Zero)],
        })
    })
}

/// I line, covering both operand spellings:
///
/// ```text
/// addi $s1, $s2, imm
/// lw   $s1, imm($s2)
/// ```
///
/// The second spelling parses the offset before the register, so it is
/// swapped back into register-first order here. Both normalize to
/// (rt, rs, imm).
fn i_type<'s>() -> impl Parser<'s, Stmt> {
    let spread = pair(register(), right(comma(), imm_or_label()));
    let paren_reg = left(
        right(wrap_padding(literal_exact("(")), register()),
        wrap_padding(literal_exact(")")),
    );
    let offset = map(pair(number, paren_reg), |(imm, rs)| (rs, Operand::Imm(imm)));
    let tail = choice(vec![boxed(spread), boxed(offset)], "operands");
    let operands = pair(right(whitespace, register()), right(comma(), tail));
    map(pair(mnemonic(isa::I_TYPE), operands), |(def, (rt, (rs, imm)))| {
        Stmt::Inst(Inst { def, args: vec![Operand::Reg(rt), Operand::Reg(rs), imm] })
    })
}

fn j_type<'s>() -> impl Parser<'s, Stmt> {
    map(pair(mnemonic(isa::J_TYPE), right(whitespace, imm_or_label())), |(def, target)| {
        Stmt::Inst(Inst { def, args: vec![target] })
    })
}

fn basic<'s>() -> impl Parser<'s, Stmt> {
    map(mnemonic(isa::BASIC), |def| Stmt::Inst(Inst { def, args: Vec::new() }))
}

/// A label declaration; the colon is cosmetic.
fn label_decl<'s>() -> impl Parser<'s, Stmt> {
    map(left(label_name, opt(literal_exact(":"))), |name: &str| Stmt::Label(Label::new(name)))
}

fn statement<'s>() -> impl Parser<'s, Stmt> {
    choice(
        vec![
            boxed(r_type()),
            boxed(reduced_r_type()),
            boxed(i_type()),
            boxed(j_type()),
            boxed(basic()),
            boxed(label_decl()),
        ],
        "statement",
    )
}

/// Parses a whole source file into its statement sequence. Anything short of
/// full consumption is a failure.
pub fn parse_asm(src: &str) -> Result<Vec<Stmt>, Fail> {
    // a file of nothing but whitespace and comments is an empty program
    if let Ok((_, end)) = padding()(src, 0) {
        if end == src.len() {
            return Ok(Vec::new());
        }
    }
    let (stmts, _) = parse_all(wrap_padding(statement()))(src, 0)?;
    Ok(stmts)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn only_inst(src: &str) -> Inst {
        let stmts = parse_asm(src).unwrap();
        assert_eq!(stmts.len(), 1, "expected a single statement in {src:?}");
        match stmts.into_iter().next().unwrap() {
            Stmt::Inst(inst) => inst,
            other => panic!("expected an instruction, got {other:?}"),
        }
    }

    #[test]
    fn r_type_line() {
        let inst = only_inst("add $s1, $s2, $s3");
        assert_eq!(inst.def.mnemonic, "add");
        assert_eq!(
            inst.args,
            vec![Operand::Reg(Reg::S1), Operand::Reg(Reg::S2), Operand::Reg(Reg::S3)]
        );
    }

    #[test]
    fn reduced_r_type_fills_in_the_zero_register() {
        let inst = only_inst("asl1 $s0, $s1");
        assert_eq!(inst.def.mnemonic, "asl1");
        assert_eq!(
            inst.args,
            vec![Operand::Reg(Reg::S0), Operand::Reg(Reg::S1), Operand::Reg(Reg::Zero)]
        );
    }

    #[test]
    fn i_type_spellings_normalize_to_the_same_operands() {
        let spread = only_inst("addi $s0, $s1, -2");
        let offset = only_inst("lw $s0, -2($s1)");
        assert_eq!(
            spread.args,
            vec![Operand::Reg(Reg::S0), Operand::Reg(Reg::S1), Operand::Imm(-2)]
        );
        assert_eq!(offset.args, spread.args);
    }

    #[test]
    fn offset_spelling_allows_inner_padding() {
        let inst = only_inst("sw $s0, 4 ( $s1 )");
        assert_eq!(
            inst.args,
            vec![Operand::Reg(Reg::S0), Operand::Reg(Reg::S1), Operand::Imm(4)]
        );
    }

    #[test]
    fn branch_lines_take_label_operands() {
        let inst = only_inst("bne $s1, $zero, loop");
        assert_eq!(inst.def.mnemonic, "bne");
        assert_eq!(inst.args[2], Operand::Label(Label::new("loop")));
    }

    #[test]
    fn j_type_takes_a_label_or_a_literal() {
        assert_eq!(only_inst("j start").args, vec![Operand::Label(Label::new("start"))]);
        assert_eq!(only_inst("j 0x40").args, vec![Operand::Imm(0x40)]);
    }

    #[test]
    fn bare_mnemonic_lines() {
        assert_eq!(only_inst("nop").args, Vec::new());
        assert_eq!(only_inst("halt").def.mnemonic, "halt");
    }

    #[test]
    fn labels_with_and_without_colon() {
        let stmts = parse_asm("start:\n  nop\nend\n").unwrap();
        assert_eq!(
            stmts,
            vec![
                Stmt::Label(Label::new("start")),
                Stmt::Inst(Inst { def: &isa::BASIC[0], args: Vec::new() }),
                Stmt::Label(Label::new("end")),
            ]
        );
    }

    #[test]
    fn reserved_words_cannot_be_labels() {
        assert!(parse_asm("add:").is_err());
        assert!(parse_asm("bne").is_err());
        assert!(parse_asm("sw: nop").is_err());
    }

    #[test]
    fn mnemonics_and_registers_match_case_insensitively() {
        let inst = only_inst("ADD $S1, $s2, $S3");
        assert_eq!(inst.def.mnemonic, "add");
    }

    #[test]
    fn comments_are_legal_anywhere_whitespace_is() {
        let src = "# header\nstart: ; marks the loop\n  addi $s0, $s0, 1 # bump\n  j start\n";
        let stmts = parse_asm(src).unwrap();
        assert_eq!(stmts.len(), 3);
    }

    #[test]
    fn empty_and_comment_only_files_are_empty_programs() {
        assert_eq!(parse_asm("").unwrap(), Vec::new());
        assert_eq!(parse_asm("  \n\t").unwrap(), Vec::new());
        assert_eq!(parse_asm("; nothing here\n# at all").unwrap(), Vec::new());
    }

    #[test]
    fn malformed_lines_report_the_failing_offset() {
        let src = "nop\n$s0\n";
        let fail = parse_asm(src).unwrap_err();
        assert_eq!(fail.at, src.find("$s0").unwrap());
        assert_eq!(fail.expected, "statement");
        assert_eq!(fail.causes.len(), 6);
    }

    #[test]
    fn missing_operand_is_an_error() {
        assert!(parse_asm("add $s1, $s2").is_err());
        assert!(parse_asm("addi $s0, $s1").is_err());
        assert!(parse_asm("j").is_err());
    }
}
