use basalt_compiler::ast::{
    promote_arithmetic, BinaryOp, EvalValue, Expr, Primitive, Stmt, Type, UnaryOp,
    VariableDeclaration,
};
use basalt_compiler::ir::{IrType, Linkage};
use basalt_compiler::{compile_to_ir, lower, Lowerer};

// ── End-to-end scenarios ─────────────────────────────────────────────────

#[test]
fn minimal_function_lowers_to_constant_return() {
    let unit = compile_to_ir("int main() { return 0; }").unwrap();

    assert!(unit.module.get_function("main").is_some());
    assert!(unit.warnings.is_empty());

    let lines = unit.module.to_lines();
    assert!(lines.contains(&"define external i32 @main() {".to_string()));
    assert!(lines.contains(&"  ret i32 0".to_string()));
}

#[test]
fn constant_initializer_folds_to_seven() {
    let unit = compile_to_ir("int main() { int x = 1 + 2 * 3; return x; }").unwrap();

    let lines = unit.module.to_lines();
    assert!(lines.iter().any(|l| l.contains("%x = alloca i32, align 4")));
    assert!(lines.iter().any(|l| l.contains("store i32 7, i32* %x")));
    assert!(lines.iter().any(|l| l.contains("load i32, i32* %x")));
}

#[test]
fn evaluation_agrees_with_lowering() {
    let initializer = Expr::binary(
        BinaryOp::Add,
        Expr::integer(1),
        Expr::binary(BinaryOp::Mul, Expr::integer(2), Expr::integer(3)),
    );
    assert_eq!(initializer.evaluate(), Some(EvalValue::Int(7)));
}

#[test]
fn function_call_passes_arguments() {
    let source = "int f(int a, int b) { return a + b; } int main() { return f(2, 3); }";
    let unit = compile_to_ir(source).unwrap();

    assert!(unit.module.get_function("f").is_some());
    assert!(unit.module.get_function("main").is_some());

    let lines = unit.module.to_lines();
    assert!(lines.contains(&"define external i32 @f(i32 %a, i32 %b) {".to_string()));
    assert!(lines.iter().any(|l| l.contains("call i32 @f(i32 2, i32 3)")));
}

#[test]
fn array_initializer_stores_each_element() {
    let decl = VariableDeclaration::new(
        Type::array(Type::simple(Primitive::Int), 3),
        "a",
        Some(Expr::array_init(vec![
            Expr::integer(1),
            Expr::integer(2),
            Expr::integer(3),
        ])),
    );
    let root = Stmt::block(vec![Stmt::function(
        Type::simple(Primitive::Void),
        "fill",
        vec![],
        Stmt::scope(vec![Stmt::VariableDeclaration(decl)]),
    )]);

    let unit = lower(&root).unwrap();
    let lines = unit.module.to_lines();

    assert!(lines.iter().any(|l| l.contains("alloca [3 x i32]")));
    assert_eq!(lines.iter().filter(|l| l.contains("store i32")).count(), 3);
    // One two-index address computation plus one advance per element break.
    assert_eq!(
        lines
            .iter()
            .filter(|l| l.contains("getelementptr inbounds"))
            .count(),
        3
    );
}

#[test]
fn pointer_declaration_inside_unsafe_lowers() {
    let pointer_decl = VariableDeclaration::new(
        Type::pointer(Type::simple(Primitive::Int)),
        "p",
        Some(Expr::unary(UnaryOp::AddressOf, Expr::identifier("x"))),
    );
    let body = Stmt::scope(vec![
        Stmt::VariableDeclaration(VariableDeclaration::new(
            Type::simple(Primitive::Int),
            "x",
            None,
        )),
        Stmt::unsafe_stmt(Stmt::scope(vec![Stmt::VariableDeclaration(pointer_decl)])),
    ]);
    let root = Stmt::block(vec![Stmt::function(
        Type::simple(Primitive::Void),
        "f",
        vec![],
        body,
    )]);

    let unit = lower(&root).unwrap();
    let lines = unit.module.to_lines();
    assert!(lines.iter().any(|l| l.contains("%p = alloca i32*, align 4")));
    assert!(lines.iter().any(|l| l.contains("store i32* %x, i32** %p")));
}

#[test]
fn string_literal_becomes_global_byte_array() {
    let decl = VariableDeclaration::new(
        Type::pointer(Type::simple(Primitive::Char)),
        "s",
        Some(Expr::string("hello")),
    );
    let root = Stmt::block(vec![Stmt::function(
        Type::simple(Primitive::Void),
        "f",
        vec![],
        Stmt::scope(vec![Stmt::unsafe_stmt(Stmt::VariableDeclaration(decl))]),
    )]);

    let unit = lower(&root).unwrap();
    assert_eq!(unit.module.global_strings().len(), 1);

    let lines = unit.module.to_lines();
    assert!(lines.contains(&"@.str.0 = constant [6 x i8] c\"hello\\00\"".to_string()));
}

// ── Assignment ───────────────────────────────────────────────────────────

#[test]
fn assignment_stores_through_loaded_address() {
    let unit = compile_to_ir("int main() { int x; x = 5; return x; }").unwrap();
    let lines = unit.module.to_lines();
    assert!(lines.iter().any(|l| l.contains("store i32 5, i32* %x")));
}

// ── Promotion table ──────────────────────────────────────────────────────

#[test]
fn promotion_follows_the_table() {
    let int_ty = Type::simple(Primitive::Int);
    let uint_ty = Type::simple_unsigned(Primitive::Int);
    let char_ty = Type::simple(Primitive::Char);
    let short_ty = Type::simple(Primitive::Short);
    let ushort_ty = Type::simple_unsigned(Primitive::Short);
    let long_ty = Type::simple(Primitive::Long);
    let half_ty = Type::simple(Primitive::Half);
    let single_ty = Type::simple(Primitive::Single);
    let double_ty = Type::simple(Primitive::Double);

    // Widest width wins; unsigned wins at equal width.
    assert_eq!(promote_arithmetic(&int_ty, &int_ty), Some(int_ty.clone()));
    assert_eq!(promote_arithmetic(&char_ty, &int_ty), Some(int_ty.clone()));
    assert_eq!(
        promote_arithmetic(&short_ty, &ushort_ty),
        Some(ushort_ty.clone())
    );
    assert_eq!(promote_arithmetic(&int_ty, &uint_ty), Some(uint_ty.clone()));
    assert_eq!(promote_arithmetic(&long_ty, &int_ty), Some(long_ty.clone()));

    // Floating beats integer.
    assert_eq!(
        promote_arithmetic(&char_ty, &half_ty),
        Some(half_ty.clone())
    );
    assert_eq!(
        promote_arithmetic(&short_ty, &single_ty),
        Some(single_ty.clone())
    );
    assert_eq!(
        promote_arithmetic(&int_ty, &double_ty),
        Some(double_ty.clone())
    );

    // The asymmetric double row.
    assert_eq!(
        promote_arithmetic(&double_ty, &int_ty),
        Some(int_ty.clone())
    );
    assert_eq!(
        promote_arithmetic(&double_ty, &uint_ty),
        Some(double_ty.clone())
    );

    // Pairs with no table entry.
    assert_eq!(promote_arithmetic(&long_ty, &half_ty), None);
    assert_eq!(promote_arithmetic(&half_ty, &short_ty), None);
    assert_eq!(promote_arithmetic(&single_ty, &single_ty), None);
    assert_eq!(promote_arithmetic(&long_ty, &double_ty), None);
}

#[test]
fn promotion_rejects_non_primitive_operands() {
    let int_ty = Type::simple(Primitive::Int);
    let ptr_ty = Type::pointer(int_ty.clone());
    assert_eq!(promote_arithmetic(&ptr_ty, &int_ty), None);
}

// ── Compile-time evaluation ──────────────────────────────────────────────

#[test]
fn evaluate_unary_operators() {
    assert_eq!(
        Expr::unary(UnaryOp::Minus, Expr::integer(5)).evaluate(),
        Some(EvalValue::Int(-5))
    );
    assert_eq!(
        Expr::unary(UnaryOp::Plus, Expr::integer(5)).evaluate(),
        Some(EvalValue::Int(5))
    );
}

#[test]
fn evaluate_fails_on_division_by_zero() {
    let expr = Expr::binary(BinaryOp::Div, Expr::integer(1), Expr::integer(0));
    assert_eq!(expr.evaluate(), None);
}

#[test]
fn evaluate_fails_on_overflow() {
    assert_eq!(EvalValue::Int(i64::MAX).add(EvalValue::Int(1)), None);
    assert_eq!(EvalValue::UInt(u64::MAX).mul(EvalValue::UInt(2)), None);
}

#[test]
fn evaluate_fails_on_unfoldable_nodes() {
    assert_eq!(Expr::identifier("x").evaluate(), None);
    assert_eq!(
        Expr::binary(BinaryOp::Assign, Expr::identifier("x"), Expr::integer(1)).evaluate(),
        None
    );
}

#[test]
fn evaluate_mixes_signed_and_unsigned() {
    assert_eq!(
        EvalValue::Int(2).add(EvalValue::UInt(3)),
        Some(EvalValue::UInt(5))
    );
    assert_eq!(EvalValue::Int(-1).add(EvalValue::UInt(3)), None);
    assert_eq!(
        EvalValue::Double(1.5).mul(EvalValue::Int(2)),
        Some(EvalValue::Double(3.0))
    );
}

// ── Lowering invariants ──────────────────────────────────────────────────

#[test]
fn scope_depth_is_restored_after_failure() {
    let mut lowerer = test_lowerer();
    let depth = lowerer.symbols.depth();

    let failing_scope = Stmt::scope(vec![Stmt::expression(Expr::identifier("missing"))]);
    assert!(lowerer.lower_stmt(&failing_scope).is_err());
    assert_eq!(lowerer.symbols.depth(), depth);

    let nested = Stmt::scope(vec![Stmt::scope(vec![Stmt::expression(
        Expr::identifier("missing"),
    )])]);
    assert!(lowerer.lower_stmt(&nested).is_err());
    assert_eq!(lowerer.symbols.depth(), depth);
}

#[test]
fn variable_slot_is_pointer_to_declared_type() {
    let mut lowerer = test_lowerer();

    let decl = Stmt::VariableDeclaration(VariableDeclaration::new(
        Type::simple(Primitive::Short),
        "s",
        None,
    ));
    lowerer.lower_stmt(&decl).unwrap();

    let slot = lowerer.symbols.lookup("s").unwrap();
    assert_eq!(
        lowerer.builder.module().type_of(slot),
        &IrType::ptr_to(IrType::Int { bits: 16 })
    );
}

#[test]
fn preprocess_registers_functions_idempotently() {
    let root = basalt_compiler::parse_to_ast("int f(int a) { return a; }").unwrap();

    let mut lowerer = Lowerer::new();
    lowerer.preprocess_stmt(&root);
    assert!(lowerer.symbols.lookup("f").is_some());
    let functions = lowerer.builder.module().functions().len();

    lowerer.preprocess_stmt(&root);
    assert_eq!(lowerer.builder.module().functions().len(), functions);
}

// ── Warnings ─────────────────────────────────────────────────────────────

#[test]
fn missing_return_synthesizes_null_value_and_warns() {
    let unit = compile_to_ir("int f() { 5; }").unwrap();

    assert_eq!(unit.warnings.len(), 1);
    assert!(unit.warnings[0]
        .message
        .starts_with("Expected return statement at the end"));

    let lines = unit.module.to_lines();
    assert!(lines.contains(&"  ret i32 0".to_string()));
}

#[test]
fn void_function_gets_implicit_return_without_warning() {
    let unit = compile_to_ir("void f() { 5; }").unwrap();
    assert!(unit.warnings.is_empty());
    assert!(unit.module.to_lines().contains(&"  ret void".to_string()));
}

#[test]
fn nested_unsafe_statement_warns() {
    let body = Stmt::scope(vec![Stmt::unsafe_stmt(Stmt::unsafe_stmt(
        Stmt::expression(Expr::integer(1)),
    ))]);
    let root = Stmt::block(vec![Stmt::function(
        Type::simple(Primitive::Void),
        "f",
        vec![],
        body,
    )]);

    let unit = lower(&root).unwrap();
    assert_eq!(unit.warnings.len(), 1);
    assert_eq!(unit.warnings[0].message, "Unnecessary unsafe statement");
}

#[test]
fn nested_unsafe_expression_warns() {
    let body = Stmt::scope(vec![Stmt::expression(Expr::unsafe_expr(
        Expr::unsafe_expr(Expr::integer(1)),
    ))]);
    let root = Stmt::block(vec![Stmt::function(
        Type::simple(Primitive::Void),
        "f",
        vec![],
        body,
    )]);

    let unit = lower(&root).unwrap();
    assert_eq!(unit.warnings.len(), 1);
    assert_eq!(unit.warnings[0].message, "Unnecessary unsafe expression");
}

// ── Helpers ──────────────────────────────────────────────────────────────

/// A lowerer positioned inside the entry block of a fresh void function, so
/// statements can be lowered directly.
fn test_lowerer() -> Lowerer {
    let mut lowerer = Lowerer::new();
    let value = lowerer.builder.add_function(
        "harness",
        Vec::new(),
        Vec::new(),
        IrType::Void,
        Linkage::External,
    );
    let func = lowerer.builder.as_function(value).unwrap();
    let entry = lowerer.builder.append_block(func, "entry");
    lowerer.builder.position_at_end(entry);
    lowerer
}
