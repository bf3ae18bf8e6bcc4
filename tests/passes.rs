//! Rewrite-pass integration tests.
//!
//! These tests exercise the passes through the public API, both on functions
//! produced by the lifter and on hand-built CFGs:
//! 1. Lift bytecode, run a pass, verify the rewritten IR still validates
//! 2. Check pass reports (rewritten vs. declined counts)
//! 3. Compose both passes and confirm idempotence of the pipeline

use bpflift::prelude::*;

fn labeled(from: usize, instruction: Instruction) -> LabeledInstruction {
    LabeledInstruction::new(Label::new(from, from + 1), instruction)
}

fn memory(from: usize, is_load: bool, base: u8, offset: i64, value: u8) -> LabeledInstruction {
    labeled(
        from,
        Instruction::Memory {
            is_load,
            width: MemWidth::B8,
            base: Reg::new(base),
            offset,
            value: Reg::new(value),
        },
    )
}

/// A lifted pointer chase: r2 = *(r1 + 0); *(r2 + 8) = r3.
///
/// The first load's result is used only as the second access's base, so the
/// resolution pass must specialize it.
fn pointer_chase() -> Result<Function> {
    let section = vec![
        memory(0, true, 1, 0, 2),
        memory(1, false, 2, 8, 3),
    ];
    // The fallthrough return consumes r0's entry parameter, so the loaded r2
    // has exactly its store-base use.
    Ok(Lifter::lift(&Program::new(vec![section]))?.into_function())
}

#[test]
fn test_resolve_memory_on_lifted_function() -> Result<()> {
    let mut func = pointer_chase()?;
    func.validate()?;

    let report = ResolveMemoryPass::new().run(&mut func)?;
    assert!(report.changed());
    assert_eq!(report.rewritten, 1);
    func.validate()?;

    // The load is now address-producing, and the store's base operand was
    // rewired to the fresh result.
    let entry = func.entry().expect("entry block");
    let resolved = entry
        .ops()
        .iter()
        .find_map(|op| match op {
            Op::Load {
                dest,
                mode: LoadMode::Addr,
                ..
            } => Some(*dest),
            _ => None,
        })
        .expect("resolved load");
    assert!(entry
        .ops()
        .iter()
        .any(|op| matches!(op, Op::Store { base, .. } if *base == resolved)));
    assert!(!entry
        .ops()
        .iter()
        .any(|op| matches!(op, Op::Load { mode: LoadMode::Int, .. })));
    Ok(())
}

#[test]
fn test_resolve_memory_keeps_scalar_loads() -> Result<()> {
    // r2 = *(r1 + 0); r2 += 1 - the result is arithmetic, not an address.
    let section = vec![
        memory(0, true, 1, 0, 2),
        labeled(
            1,
            Instruction::Binary {
                op: AluOp::Add,
                dst: Reg::new(2),
                src: Operand::Imm(1),
            },
        ),
        labeled(
            2,
            Instruction::Binary {
                op: AluOp::Mov,
                dst: Reg::new(0),
                src: Operand::Reg(Reg::new(2)),
            },
        ),
    ];
    let mut func = Lifter::lift(&Program::new(vec![section]))?.into_function();

    let report = ResolveMemoryPass::new().run(&mut func)?;
    assert!(!report.changed());
    assert_eq!(report.declined, 1);
    assert!(func
        .entry()
        .expect("entry block")
        .ops()
        .iter()
        .any(|op| matches!(op, Op::Load { mode: LoadMode::Int, .. })));
    Ok(())
}

/// Hand-built loop whose body functionally writes one array element and
/// selects between the new and old array before branching back.
fn select_loop() -> (Function, BlockId) {
    let mut func = Function::new("loop");
    let entry = func.add_block(3);
    let body = func.add_block(3);
    let entry_params: Vec<_> = func.block(entry).params().to_vec();
    func.block_mut(entry).push(Op::Branch {
        target: body,
        args: entry_params,
    });

    let array = func.block(body).params()[0];
    let index = func.block(body).params()[1];
    let cond = func.block(body).params()[2];

    let element = func.alloc_value();
    func.block_mut(body).push(Op::Read {
        dest: element,
        array,
        index,
    });
    let written = func.alloc_value();
    func.block_mut(body).push(Op::Write {
        dest: written,
        array,
        index,
        value: cond,
        in_place: false,
    });
    let selected = func.alloc_value();
    func.block_mut(body).push(Op::Select {
        dest: selected,
        cond,
        true_value: written,
        false_value: array,
    });
    // A read of the *old* array placed after the select.
    let stale = func.alloc_value();
    func.block_mut(body).push(Op::Read {
        dest: stale,
        array,
        index: element,
    });
    func.block_mut(body).push(Op::Branch {
        target: body,
        args: vec![selected, stale, cond],
    });
    (func, body)
}

#[test]
fn test_write_liveness_select_loop() -> Result<()> {
    let (mut func, body) = select_loop();
    func.validate()?;

    let report = WriteLivenessPass::new().run(&mut func)?;
    assert_eq!(report.rewritten, 1);
    func.validate()?;

    let ops = func.block(body).ops();
    let write_at = ops
        .iter()
        .position(|op| matches!(op, Op::Write { .. }))
        .expect("write");
    let select_at = ops
        .iter()
        .position(|op| matches!(op, Op::Select { .. }))
        .expect("select");
    assert!(matches!(ops[write_at], Op::Write { in_place: true, .. }));

    // Every read of the old array now sits before the select.
    let Op::Write { array, .. } = ops[write_at] else {
        unreachable!();
    };
    for (position, op) in ops.iter().enumerate() {
        if let Op::Read { array: read, .. } = op {
            if *read == array {
                assert!(position < select_at, "read at {position} after select");
            }
        }
    }
    Ok(())
}

#[test]
fn test_write_liveness_respects_observed_results() -> Result<()> {
    // The written array is read before it leaves on the back edge: two
    // consuming operations, so the write must remain functional.
    let mut func = Function::new("loop");
    let body = func.add_block(2);
    let array = func.block(body).params()[0];
    let index = func.block(body).params()[1];
    let written = func.alloc_value();
    func.block_mut(body).push(Op::Write {
        dest: written,
        array,
        index,
        value: index,
        in_place: false,
    });
    let element = func.alloc_value();
    func.block_mut(body).push(Op::Read {
        dest: element,
        array: written,
        index,
    });
    func.block_mut(body).push(Op::Branch {
        target: body,
        args: vec![written, element],
    });
    func.validate()?;

    let report = WriteLivenessPass::new().run(&mut func)?;
    assert_eq!(report.rewritten, 0);
    assert_eq!(report.declined, 1);
    assert!(matches!(
        func.block(body).ops()[0],
        Op::Write {
            in_place: false,
            ..
        }
    ));
    Ok(())
}

#[test]
fn test_pass_pipeline_is_idempotent() -> Result<()> {
    let (mut func, _) = select_loop();

    let passes: Vec<Box<dyn FunctionPass>> = vec![
        Box::new(ResolveMemoryPass::new()),
        Box::new(WriteLivenessPass::new()),
    ];
    for pass in &passes {
        pass.run(&mut func)?;
    }
    func.validate()?;
    let snapshot = format!("{func}");

    // A second round of the same pipeline finds nothing left to rewrite.
    for pass in &passes {
        let report = pass.run(&mut func)?;
        assert!(!report.changed(), "{} changed settled IR", pass.name());
    }
    assert_eq!(format!("{func}"), snapshot);
    Ok(())
}

#[test]
fn test_pass_names() {
    assert_eq!(ResolveMemoryPass::new().name(), "resolve-memory");
    assert_eq!(WriteLivenessPass::new().name(), "write-liveness");
}
