//! Benchmarks for bytecode lifting and rewrite passes.
//!
//! Measures the three main costs of the pipeline:
//! - Lifting a straight-line section (no boundaries beyond offset 0)
//! - Lifting a branch-heavy section (many small blocks, full register
//!   vectors on every edge)
//! - Running the memory-resolution pass over a lifted function

extern crate bpflift;

use bpflift::prelude::*;
use criterion::{criterion_group, criterion_main, Criterion};
use std::hint::black_box;

fn alu(from: usize, op: AluOp, dst: u8, src: Operand) -> LabeledInstruction {
    LabeledInstruction::new(
        Label::new(from, from + 1),
        Instruction::Binary {
            op,
            dst: Reg::new(dst),
            src,
        },
    )
}

/// A straight-line section of `len` ALU instructions cycling over r1..r9.
fn straight_line(len: usize) -> Program {
    let section = (0..len)
        .map(|offset| {
            let dst = 1 + (offset % 9) as u8;
            alu(offset, AluOp::Add, dst, Operand::Imm(offset as i64))
        })
        .collect();
    Program::new(vec![section])
}

/// A section alternating ALU work with short forward jumps, so roughly every
/// other instruction starts a block.
fn branchy(len: usize) -> Program {
    let section = (0..len)
        .map(|offset| {
            if offset % 2 == 0 && offset + 1 < len {
                LabeledInstruction::new(
                    Label::new(offset, offset + 1),
                    Instruction::Jump {
                        target: offset + 1,
                        condition: None,
                    },
                )
            } else {
                alu(offset, AluOp::Add, 1, Operand::Imm(1))
            }
        })
        .collect();
    Program::new(vec![section])
}

/// A section of pointer chases: each load's result is the next access's base,
/// giving the resolution pass one candidate per pair.
fn pointer_chases(pairs: usize) -> Program {
    let mut section = Vec::with_capacity(pairs * 2);
    for pair in 0..pairs {
        let from = pair * 2;
        section.push(LabeledInstruction::new(
            Label::new(from, from + 1),
            Instruction::Memory {
                is_load: true,
                width: MemWidth::B8,
                base: Reg::new(1),
                offset: 0,
                value: Reg::new(2),
            },
        ));
        section.push(LabeledInstruction::new(
            Label::new(from + 1, from + 2),
            Instruction::Memory {
                is_load: false,
                width: MemWidth::B8,
                base: Reg::new(2),
                offset: 8,
                value: Reg::new(3),
            },
        ));
    }
    Program::new(vec![section])
}

fn bench_lift_straight_line(c: &mut Criterion) {
    let program = straight_line(1024);
    c.bench_function("lift_straight_line_1024", |b| {
        b.iter(|| {
            let lifted = Lifter::lift(black_box(&program)).unwrap();
            black_box(lifted)
        });
    });
}

fn bench_lift_branchy(c: &mut Criterion) {
    let program = branchy(1024);
    c.bench_function("lift_branchy_1024", |b| {
        b.iter(|| {
            let lifted = Lifter::lift(black_box(&program)).unwrap();
            black_box(lifted)
        });
    });
}

fn bench_resolve_memory(c: &mut Criterion) {
    let program = pointer_chases(256);
    let template = Lifter::lift(&program).unwrap().into_function();
    c.bench_function("resolve_memory_256_chases", |b| {
        b.iter(|| {
            let mut func = template.clone();
            let report = ResolveMemoryPass::new().run(&mut func).unwrap();
            black_box((func, report))
        });
    });
}

criterion_group!(
    benches,
    bench_lift_straight_line,
    bench_lift_branchy,
    bench_resolve_memory
);
criterion_main!(benches);
