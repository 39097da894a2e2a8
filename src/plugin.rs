use bevy::prelude::*;

use crate::cpu::params::{Colliders, FluidSettings, InteractionInput};
use crate::cpu::sph2d::SPHState;
use crate::error::SimError;

/// Fired once for every completed solver step.
#[derive(Event, Debug, Clone, Copy, PartialEq, Eq)]
pub struct StepCompleted {
    pub step: u64,
}

/// Host-side pause / single-step / reset switches.
#[derive(Resource, Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct SimControl {
    pub paused: bool,
    pub step_once: bool,
    pub reset_requested: bool,
}

pub struct SphPlugin;

impl Plugin for SphPlugin {
    fn build(&self, app: &mut App) {
        app.init_resource::<FluidSettings>()
            .init_resource::<InteractionInput>()
            .init_resource::<Colliders>()
            .init_resource::<SimControl>()
            .add_event::<StepCompleted>()
            .add_systems(Update, advance_simulation);
    }
}

/// Runs `iterations_per_frame` solver steps per frame. The `SPHState`
/// resource is inserted by the host once it has an initial layout.
pub fn advance_simulation(
    sph: Option<ResMut<SPHState>>,
    settings: Res<FluidSettings>,
    interaction: Res<InteractionInput>,
    colliders: Res<Colliders>,
    mut control: ResMut<SimControl>,
    time: Res<Time>,
    mut completed: EventWriter<StepCompleted>,
    mut last_error: Local<Option<SimError>>,
) {
    let Some(mut sph) = sph else {
        return;
    };

    if control.reset_requested {
        control.reset_requested = false;
        sph.reset();
    }

    if control.paused && !control.step_once {
        return;
    }
    control.step_once = false;

    let frame_dt = time.delta_secs();
    let num_particles = sph.capacity();
    let params = settings.frame_params(frame_dt, num_particles, &interaction, &colliders);

    for _ in 0..settings.iterations_per_frame {
        if let Err(e) = sph.step(&params) {
            // settings stay invalid until the host changes them; report each error once
            if last_error.as_ref() != Some(&e) {
                error!("SPH step discarded: {e}");
                *last_error = Some(e);
            }
            return;
        }
        *last_error = None;
        completed.write(StepCompleted {
            step: sph.steps_completed(),
        });
    }
}
