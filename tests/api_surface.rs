use staking_sim_ops::prelude::*;

#[test]
fn prelude_compiles_and_exports_core() {
    let _ = arb_commission_rates();
    let _ = arb_validator_stake(1_000);
    let _ = arb_description(4);
    let config = GeneratorConfig::default();
    assert_eq!(config.description_len, 10);
    assert_eq!(OperationKind::ALL.len(), 5);
    assert!(OperationOutcome::NoOp.is_noop());
}
