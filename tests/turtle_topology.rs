// tests/turtle_topology.rs
use glam::IVec3;
use symbios::{SymbiosState, SymbolTable};
use symbios_plantpack::{
    Axion, BlockGeneration, TreeBlock, TreeBlockKind, TreeError, TreeInterpreter, TreeOp,
    TreeTurtleState, TurtleConfig,
};

fn trunk() -> TreeBlock {
    TreeBlock::trunk("Test:Trunk")
}

fn leaf() -> TreeBlock {
    TreeBlock::foliage("Test:Leaf")
}

fn branch() -> TreeBlock {
    TreeBlock::branch("Test:Branch")
}

fn setup(ops: &[(&str, TreeOp)], config: TurtleConfig) -> (TreeInterpreter, SymbolTable) {
    let mut interner = SymbolTable::new();
    let mut interpreter = TreeInterpreter::new(config);

    // Intern symbols
    for (sym, _) in ops {
        interner.intern(*sym).unwrap();
    }
    for sym in ["[", "]", "+", "&"] {
        interner.intern(sym).unwrap();
    }

    // Map them
    interpreter.populate_structural_symbols(&interner);
    for (sym, op) in ops {
        interpreter.set_op(interner.resolve_id(*sym).unwrap(), op.clone());
    }

    (interpreter, interner)
}

fn unit_trunk() -> (TreeInterpreter, SymbolTable) {
    setup(
        &[(
            "T",
            TreeOp::Generate(BlockGeneration::default_block(trunk(), 1.0)),
        )],
        TurtleConfig::default(),
    )
}

#[test]
fn test_straight_trunk_grows_up() {
    let (interpreter, interner) = unit_trunk();
    let t_id = interner.resolve_id("T").unwrap();

    let mut state = SymbiosState::new();
    for _ in 0..3 {
        state.push(t_id, 0.0, &[]).unwrap();
    }

    let structure = interpreter.build_structure(&state).unwrap();

    assert_eq!(structure.len(), 3, "Each T places one trunk voxel");
    for y in 0..3 {
        assert_eq!(structure.get(IVec3::new(0, y, 0)), Some(&trunk()));
    }
}

#[test]
fn test_branch_returns_to_junction() {
    let (interpreter, interner) = unit_trunk();
    let t_id = interner.resolve_id("T").unwrap();
    let push_id = interner.resolve_id("[").unwrap();
    let pop_id = interner.resolve_id("]").unwrap();
    let pitch_id = interner.resolve_id("&").unwrap();

    // Grammar: T [ &(90) T T ] T T
    // 1. Trunk at (0,0,0); turtle moves to (0,1,0).
    // 2. Branch pitched 90° about X grows along +Z: (0,1,0), (0,1,1).
    // 3. Pop restores (0,1,0) heading up: (0,1,0), (0,2,0).
    let mut state = SymbiosState::new();
    state.push(t_id, 0.0, &[]).unwrap();
    state.push(push_id, 0.0, &[]).unwrap();
    state.push(pitch_id, 0.0, &[90.0]).unwrap();
    state.push(t_id, 0.0, &[]).unwrap();
    state.push(t_id, 0.0, &[]).unwrap();
    state.push(pop_id, 0.0, &[]).unwrap();
    state.push(t_id, 0.0, &[]).unwrap();
    state.push(t_id, 0.0, &[]).unwrap();

    let structure = interpreter.build_structure(&state).unwrap();

    assert_eq!(structure.len(), 4);
    assert!(structure.get(IVec3::new(0, 1, 1)).is_some(), "Branch voxel");
    assert!(structure.get(IVec3::new(0, 2, 0)).is_some(), "Trunk resumes");
    assert!(structure.get(IVec3::new(0, 1, 2)).is_none());
}

#[test]
fn test_turn_spins_the_pitch_plane() {
    let (interpreter, interner) = unit_trunk();

    // Turning 90° around the heading moves the pitch axis, so the branch
    // leans along +X instead of +Z.
    let state = Axion::new("+(90)&(90)TT").to_state(&interner).unwrap();
    let structure = interpreter.build_structure(&state).unwrap();

    assert!(structure.get(IVec3::new(1, 0, 0)).is_some());
    assert!(structure.get(IVec3::new(0, 0, 1)).is_none());
}

#[test]
fn test_unbalanced_pop_is_fatal() {
    let (interpreter, interner) = unit_trunk();
    let state = Axion::new("T]T").to_state(&interner).unwrap();

    let err = interpreter.build_structure(&state).unwrap_err();
    assert_eq!(err, TreeError::UnbalancedPop { index: 1 });
}

#[test]
fn test_stack_depth_is_bounded() {
    let config = TurtleConfig {
        max_stack_depth: 2,
        ..Default::default()
    };
    let (interpreter, interner) = setup(&[], config);
    let state = Axion::new("[[[").to_state(&interner).unwrap();

    let err = interpreter.build_structure(&state).unwrap_err();
    assert_eq!(
        err,
        TreeError::StackOverflow {
            index: 2,
            max_depth: 2
        }
    );
}

#[test]
fn test_symbol_without_operation_is_fatal() {
    let (interpreter, mut interner) = unit_trunk();
    interner.intern("X").unwrap();
    let state = Axion::new("TX").to_state(&interner).unwrap();

    let err = interpreter.build_structure(&state).unwrap_err();
    assert!(matches!(err, TreeError::UnmappedSymbolId { index: 1, .. }));
}

#[test]
fn test_unknown_symbol_cannot_be_compiled() {
    let (_, interner) = unit_trunk();
    let err = Axion::new("TQ").to_state(&interner).unwrap_err();
    assert_eq!(err, TreeError::UnmappedSymbol { symbol: 'Q' });
}

#[test]
fn test_surround_clipping_respects_max_z() {
    let rule = BlockGeneration::surround(branch(), leaf(), 1.0, 3.0).with_max_z(0.0);
    let (interpreter, interner) = setup(&[("b", TreeOp::Generate(rule))], TurtleConfig::default());
    let state = Axion::new("b").to_state(&interner).unwrap();

    let structure = interpreter.build_structure(&state).unwrap();

    assert!(structure.count_kind(TreeBlockKind::Foliage) > 0);
    assert_eq!(structure.get(IVec3::ZERO), Some(&branch()), "Core at turtle");
    for (pos, _) in structure.iter() {
        assert!(pos.z <= 0, "Voxel {pos} lies above the clip plane");
        assert!(pos.as_vec3().length() <= 3.0);
    }
    assert!(structure.get(IVec3::new(0, 0, -3)).is_some());
}

#[test]
fn test_clipping_follows_pitched_turtle() {
    let rule = BlockGeneration::surround(branch(), leaf(), 1.0, 3.0).with_max_z(0.0);
    let (interpreter, interner) = setup(&[("b", TreeOp::Generate(rule))], TurtleConfig::default());
    let state = Axion::new("&(45)b").to_state(&interner).unwrap();

    let structure = interpreter.build_structure(&state).unwrap();

    let mut turtle = TreeTurtleState::default();
    turtle.rotate_local_x(45f32.to_radians());
    for (pos, _) in structure.iter() {
        let local = turtle.to_local(pos.as_vec3());
        assert!(local.z <= 1e-4, "Voxel {pos} lies above the pitched clip plane");
    }

    // Leans toward the pitched heading: world z > 0 but local z < 0.
    assert!(structure.get(IVec3::new(0, 2, 1)).is_some());
    // Straight down the pitched local Z axis.
    assert!(structure.get(IVec3::new(0, -2, 2)).is_none());
    assert!(structure.get(IVec3::new(0, 0, -2)).is_some());
}

#[test]
fn test_elongated_surround_follows_heading() {
    let rule = BlockGeneration::elongated(branch(), leaf(), 0.0, 1.1, 3.5);
    let (interpreter, interner) = setup(&[("B", TreeOp::Generate(rule))], TurtleConfig::default());
    let state = Axion::new("B").to_state(&interner).unwrap();

    let structure = interpreter.build_structure(&state).unwrap();

    // Capsule from y = 0 to y = 3.5 with radius 1.1.
    assert!(structure.get(IVec3::new(0, 4, 0)).is_some());
    assert!(structure.get(IVec3::new(1, 3, 0)).is_some());
    assert!(structure.get(IVec3::new(0, 5, 0)).is_none());
    assert!(structure.get(IVec3::new(2, 0, 0)).is_none());
    assert!(structure.get(IVec3::new(0, -2, 0)).is_none());
}

#[test]
fn test_advance_only_moves() {
    let (interpreter, interner) = setup(
        &[
            ("M", TreeOp::Generate(BlockGeneration::advance_only(2.0))),
            (
                "T",
                TreeOp::Generate(BlockGeneration::default_block(trunk(), 1.0)),
            ),
        ],
        TurtleConfig::default(),
    );
    let state = Axion::new("MT").to_state(&interner).unwrap();

    let structure = interpreter.build_structure(&state).unwrap();

    assert_eq!(structure.len(), 1);
    assert!(structure.get(IVec3::new(0, 2, 0)).is_some());
}

#[test]
fn test_leaves_never_cover_wood() {
    let (interpreter, interner) = setup(
        &[
            (
                "T",
                TreeOp::Generate(BlockGeneration::default_block(trunk(), 0.0)),
            ),
            (
                "t",
                TreeOp::Generate(BlockGeneration::surround(leaf(), leaf(), 0.0, 2.0)),
            ),
            (
                "W",
                TreeOp::Generate(BlockGeneration::surround(branch(), leaf(), 0.0, 1.0)),
            ),
        ],
        TurtleConfig::default(),
    );

    // Emission order must not matter: trunk beats branch beats leaves.
    for text in ["TtW", "WtT", "tWT"] {
        let state = Axion::new(text).to_state(&interner).unwrap();
        let structure = interpreter.build_structure(&state).unwrap();
        assert_eq!(structure.get(IVec3::ZERO), Some(&trunk()), "order {text}");
    }
}
