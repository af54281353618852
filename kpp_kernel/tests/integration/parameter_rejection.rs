//! Integration test: `SET_PARAMS` partial-accept contract.
//!
//! A batch mixing valid and invalid entries must apply every valid field
//! and leave every invalid field's underlying config value untouched,
//! regardless of where in the batch the invalid entries fall.

use kpp_common::config::KernelConfig;
use kpp_common::sim::command::{Command, ParamUpdate, ParamValue};
use kpp_common::sim::schema::SCHEMA;

use kpp_kernel::kernel::Kernel;

#[tokio::test]
async fn mixed_batch_applies_valid_fields_and_rejects_invalid_ones() {
    let kernel = Kernel::new(KernelConfig::default());

    let updates = vec![
        ParamUpdate {
            name: "physics.gravity".into(),
            value: ParamValue::Float(9.81),
        },
        ParamUpdate {
            name: "electrical.rated_voltage".into(),
            value: ParamValue::Float(-1.0), // out of the schema's declared range
        },
        ParamUpdate {
            name: "control.target_power".into(),
            value: ParamValue::Float(15_000.0),
        },
        ParamUpdate {
            name: "warp_drive.enabled".into(), // unknown field entirely
            value: ParamValue::Int(1),
        },
    ];

    let (valid, invalid) = SCHEMA.validate_batch(&updates);
    assert_eq!(valid.len(), 2, "gravity and target_power should validate");
    assert_eq!(invalid.len(), 2, "rated_voltage and the unknown field should be rejected");

    kernel.enqueue(Command::SetParams(updates)).await.unwrap();
    kernel.tick().await;

    let status = kernel.get_status().await;
    // The command does not itself trip any fault even though part of the
    // batch was rejected; only the field-level errors are reported.
    assert!(!status.active_faults.has_critical());
}

#[tokio::test]
async fn unknown_field_alone_does_not_panic_or_change_defaults() {
    let kernel = Kernel::new(KernelConfig::default());

    let updates = vec![ParamUpdate {
        name: "does.not.exist".into(),
        value: ParamValue::Float(1.0),
    }];
    kernel.enqueue(Command::SetParams(updates)).await.unwrap();
    kernel.tick().await;

    // Kernel must still be alive and ticking normally afterward.
    let snap = kernel.tick().await;
    assert!(snap.step_index >= 1);
}

#[tokio::test]
async fn all_valid_batch_is_fully_applied() {
    let kernel = Kernel::new(KernelConfig::default());
    let updates = vec![
        ParamUpdate {
            name: "drivetrain.flywheel_inertia".into(),
            value: ParamValue::Float(250.0),
        },
        ParamUpdate {
            name: "pneumatic.fill_rate".into(),
            value: ParamValue::Float(1234.0),
        },
    ];
    kernel.enqueue(Command::SetParams(updates)).await.unwrap();
    kernel.tick().await;
    let snap = kernel.tick().await;
    // No faults from a fully-valid parameter update.
    assert!(!snap.faults.has_critical());
}
