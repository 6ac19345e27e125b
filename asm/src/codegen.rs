//! The assembler pipeline: address assignment, label resolution, and
//! encoding. All three passes walk the same immutable statement sequence.

use arch::isa::{self, Format, InstDef, ADDR_STEP};
use arch::reg::Reg;

use crate::error::Error;
use crate::grammar::{Inst, Operand, Stmt};
use crate::label::Labels;

/// An operand after label resolution, ready for bit packing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Value {
    Reg(Reg),
    Imm(i32),
}

pub fn assemble(stmts: &[Stmt]) -> Result<Vec<u16>, Error> {
    let labels = collect_labels(stmts)?;
    encode_program(stmts, &labels)
}

/// First pass: bind every label to the address of the instruction that
/// follows it. Labels occupy no space of their own.
pub fn collect_labels(stmts: &[Stmt]) -> Result<Labels, Error> {
    let mut labels = Labels::new();
    let mut addr: u16 = 0;
    for stmt in stmts {
        match stmt {
            Stmt::Label(label) => labels.bind(label.clone(), addr)?,
            Stmt::Inst(_) => addr += ADDR_STEP,
        }
    }
    Ok(labels)
}

/// Second and third pass: resolve label operands through the completed
/// symbol table, then pack each instruction into its word. The address
/// counter here advances exactly as the first pass did.
fn encode_program(stmts: &[Stmt], labels: &Labels) -> Result<Vec<u16>, Error> {
    let mut words = Vec::new();
    let mut addr: u16 = 0;
    for stmt in stmts {
        if let Stmt::Inst(inst) = stmt {
            let args = resolve_args(inst, labels)?;
            words.push(encode(addr, inst.def, &args)?);
            addr += ADDR_STEP;
        }
    }
    Ok(words)
}

fn resolve_args(inst: &Inst, labels: &Labels) -> Result<Vec<Value>, Error> {
    inst.args
        .iter()
        .map(|arg| match arg {
            Operand::Reg(reg) => Ok(Value::Reg(*reg)),
            Operand::Imm(imm) => Ok(Value::Imm(*imm)),
            Operand::Label(label) => labels.resolve(label).map(|addr| Value::Imm(addr as i32)),
        })
        .collect()
}

/// Packs one instruction into its word, dispatching on the descriptor
/// format. Pure: the only inputs are the instruction's own address, its
/// descriptor, and its resolved operands.
fn encode(addr: u16, def: &InstDef, args: &[Value]) -> Result<u16, Error> {
    match (def.format, args) {
        (Format::Basic, []) => Ok(isa::enc_basic(def.opcode)),

        (Format::RType { funct }, [Value::Reg(rd), Value::Reg(rs), Value::Reg(rt)])
        | (Format::ReducedRType { funct }, [Value::Reg(rd), Value::Reg(rs), Value::Reg(rt)]) => {
            if funct >= 32 {
                return Err(Error::FunctOutOfRange { mnemonic: def.mnemonic, funct });
            }
            Ok(isa::enc_r(def.opcode, rs.addr(), rt.addr(), rd.addr(), funct))
        }

        (Format::IType, [Value::Reg(rt), Value::Reg(rs), Value::Imm(imm)]) => {
            let imm = check_signed(def.mnemonic, *imm, isa::I_IMM_BITS)?;
            Ok(isa::enc_i(def.opcode, rs.addr(), rt.addr(), imm))
        }

        (Format::Branch, [Value::Reg(rt), Value::Reg(rs), Value::Imm(target)]) => {
            // displacement is in words, relative to the following instruction
            let offset = *target - addr as i32 - ADDR_STEP as i32;
            if offset % ADDR_STEP as i32 != 0 {
                return Err(Error::UnalignedBranch { mnemonic: def.mnemonic, offset });
            }
            let disp = check_signed(def.mnemonic, offset / ADDR_STEP as i32, isa::I_IMM_BITS)?;
            Ok(isa::enc_i(def.opcode, rs.addr(), rt.addr(), disp))
        }

        (Format::JType, [Value::Imm(target)]) => {
            if *target < 0 || *target >= (1 << isa::J_IMM_BITS) {
                return Err(Error::TargetOutOfRange {
                    mnemonic: def.mnemonic,
                    value: *target,
                    bits: isa::J_IMM_BITS,
                });
            }
            Ok(isa::enc_j(def.opcode, *target as u16))
        }

        _ => Err(Error::BadOperands { mnemonic: def.mnemonic }),
    }
}

/// Checks a two's-complement range, then truncates to the field width.
fn check_signed(mnemonic: &'static str, value: i32, bits: u32) -> Result<u16, Error> {
    let min = -(1 << (bits - 1));
    let max = (1 << (bits - 1)) - 1;
    if value < min || value > max {
        return Err(Error::ImmOutOfRange { mnemonic, value, bits });
    }
    Ok(value as u16 & (((1u32 << bits) - 1) as u16))
}
