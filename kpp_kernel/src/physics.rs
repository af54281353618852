//! Fixed-step physics integrator: buoyancy, gravity, drag, and the chain
//! constraint, advanced by semi-implicit Euler.
//!
//! A pure function operating on explicit state and params rather than
//! hidden globals, in the style of `control::pid::pid_compute`.

use kpp_common::consts::DRAG_VELOCITY_EPSILON;
use kpp_common::error::CriticalSubsystemFault;
use kpp_common::sim::chain::ChainState;
use kpp_common::sim::control::HypothesisFlags;
use kpp_common::sim::floater::Floater;

use kpp_common::config::{HypothesisParams, PhysicsParams};

/// Per-step physics result, consumed by the drivetrain pipeline.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PhysicsOutput {
    /// Net chain torque this step [N*m], `net_chain_force * sprocket_radius`.
    pub net_chain_torque: f64,
    /// Net chain force this step [N], before the generator reaction term.
    pub net_chain_force: f64,
}

/// The fixed-step kinematic integrator.
pub struct PhysicsEngine;

impl PhysicsEngine {
    /// Advance `chain` and every floater in `floaters` by one step of
    /// `params.dt`, given the generator reaction torque computed on the
    /// *previous* step (breaking the drivetrain/physics cycle per the
    /// fixed pipeline order).
    ///
    /// `flywheel_inertia` is the drivetrain's flywheel moment of inertia,
    /// reflected into the chain's effective inertial mass as
    /// `I / sprocket_radius^2`.
    pub fn step(
        chain: &mut ChainState,
        floaters: &mut [Floater],
        params: &PhysicsParams,
        hyp_params: &HypothesisParams,
        hypotheses: &HypothesisFlags,
        flywheel_inertia: f64,
        gen_reaction_torque: f64,
    ) -> Result<PhysicsOutput, CriticalSubsystemFault> {
        let g = params.gravity;
        let rho_water = params.water_density;

        let rho_eff = if hypotheses.h1_nanobubbles {
            rho_water * (1.0 - hyp_params.h1_nanobubble_void_fraction * hyp_params.h1_drag_reduction_factor)
        } else {
            rho_water
        };

        let v_abs = chain.velocity.abs();
        let drag_floor = if v_abs < DRAG_VELOCITY_EPSILON {
            DRAG_VELOCITY_EPSILON
        } else {
            v_abs
        };

        let mut net_force = 0.0;
        let mut total_floater_mass = 0.0;

        for floater in floaters.iter() {
            let mass = floater.mass(rho_water);
            total_floater_mass += mass;

            let mut buoyant = rho_eff * floater.geometry.volume * g;
            if hypotheses.h2_thermal {
                buoyant += buoyant * hyp_params.h2_enhancement_coefficient * hyp_params.h2_thermal_delta_factor;
            }
            let weight = mass * g;
            let drag = 0.5 * rho_water * floater.geometry.drag_coefficient * floater.geometry.area * drag_floor * v_abs;

            let contribution = if floater.is_ascending() {
                buoyant - weight - drag
            } else {
                weight - buoyant - drag
            };
            net_force += contribution;
        }

        let f_gen = gen_reaction_torque / params.sprocket_radius;
        let reflected_inertia_mass = flywheel_inertia / (params.sprocket_radius * params.sprocket_radius);
        let m_total = total_floater_mass + reflected_inertia_mass;

        let accel = (net_force - f_gen) / m_total;
        let new_velocity = chain.velocity + accel * params.dt;

        if !new_velocity.is_finite() {
            return Err(CriticalSubsystemFault::NonFiniteValue("chain_velocity"));
        }
        if new_velocity.abs() > params.velocity_cap {
            return Err(CriticalSubsystemFault::IntegrationDivergence {
                velocity: new_velocity.abs(),
                cap: params.velocity_cap,
            });
        }

        chain.velocity = new_velocity;
        let delta_angle = new_velocity * params.dt / params.sprocket_radius;
        chain.angular_position += delta_angle;

        for floater in floaters.iter_mut() {
            floater.velocity = new_velocity;
            floater.angle = Floater::wrap_angle(floater.angle + delta_angle);
        }

        Ok(PhysicsOutput {
            net_chain_torque: net_force * params.sprocket_radius,
            net_chain_force: net_force,
        })
    }
}
