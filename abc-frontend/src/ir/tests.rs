//! Unit tests for the IR module

use super::*;

#[test]
fn test_ir_values() {
    let temp = Value::Temp(5);
    let constant = Value::Constant(42);
    let global = Value::Global("main".to_string());

    assert_eq!(format!("{}", temp), "%5");
    assert_eq!(format!("{}", constant), "42");
    assert_eq!(format!("{}", global), "@main");
    assert_eq!(format!("{}", Value::FloatConstant(1.0)), "1.0");
    assert!(Value::Aggregate(vec![Value::Constant(1), Value::Null]).is_constant());
    assert!(!Value::Aggregate(vec![Value::Temp(0)]).is_constant());
}

#[test]
fn test_basic_block() {
    let mut block = BasicBlock::new(0);
    assert!(block.is_empty());
    assert!(!block.has_terminator());

    block.add_instruction(Instruction::Comment("test".to_string()));
    assert!(!block.is_empty());
    assert!(!block.has_terminator());

    block.add_instruction(Instruction::BranchCond {
        condition: Value::Temp(0),
        true_label: 1,
        false_label: 2,
    });
    assert!(block.has_terminator());
    assert_eq!(block.successors, vec![1, 2]);
}

#[test]
fn test_ir_builder() {
    let mut builder = IrBuilder::new();

    let func = builder.create_function("add".to_string(), IrType::I32);
    func.add_parameter(0, IrType::I32);
    func.add_parameter(1, IrType::I32);
    builder.add_parameter(2, IrType::I32);

    let entry_label = builder.new_label();
    builder.create_block(entry_label).unwrap();

    let result = builder.build_binary(
        IrBinaryOp::Add,
        Value::Temp(0),
        Value::Temp(1),
        IrType::I32,
    ).unwrap();
    assert_eq!(result, 3);

    builder.build_return(Some(Value::Temp(result))).unwrap();
    assert!(builder.current_block_has_terminator());

    // Nothing may follow a terminator
    assert!(builder.build_return(None).is_err());

    let function = builder.finish_function().unwrap();
    assert_eq!(function.name, "add");
    assert_eq!(function.blocks.len(), 1);
    assert!(!function.blocks[0].is_empty());
}

#[test]
fn test_predecessors_are_linked() {
    let mut builder = IrBuilder::new();
    builder.create_function("f".to_string(), IrType::Void);
    let entry = builder.new_label();
    let exit = builder.new_label();
    builder.create_block(entry).unwrap();
    builder.build_branch(exit).unwrap();
    builder.create_block(exit).unwrap();
    builder.build_return(None).unwrap();

    let function = builder.finish_function().unwrap();
    assert_eq!(function.get_block(exit).unwrap().predecessors, vec![entry]);
}

#[test]
fn test_builder_without_function() {
    let mut builder = IrBuilder::new();
    assert!(builder.create_block(0).is_err());
    assert!(builder.build_return(None).is_err());
    assert!(builder.finish_function().is_none());
}

#[test]
fn test_module() {
    let mut module = Module::new("test".to_string());

    let function = Function::new("main".to_string(), IrType::I32);
    module.add_function(function);

    let global = GlobalVariable {
        name: "global_var".to_string(),
        var_type: IrType::I32,
        is_constant: false,
        initializer: Some(Value::Constant(42)),
        linkage: Linkage::External,
    };
    module.add_global(global);

    assert_eq!(module.functions.len(), 1);
    assert_eq!(module.globals.len(), 1);
    assert!(module.get_function("main").is_some());
    assert!(module.get_global("global_var").is_some());

    let text = module.to_string();
    assert!(text.contains("@global_var = global i32 42"));
    assert!(text.contains("define i32 @main()"));

    let json = module.to_json().unwrap();
    let parsed: serde_json::Value = serde_json::from_str(&json).unwrap();
    assert_eq!(parsed["name"], "test");
    assert_eq!(parsed["globals"][0]["name"], "global_var");
}
