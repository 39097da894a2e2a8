use bevy::input::ButtonInput;
use bevy::prelude::*;
use bevy::sprite::Sprite;
use bevy::window::PrimaryWindow;
use bevy_sph2d::{
    BoxCollider, CircleCollider, Colliders, InitialLayout, InteractionInput, SPHState, SimControl,
    SphPlugin, StepCompleted,
};
use glam::Vec2 as GVec2;

#[derive(Component)]
struct ParticleVisual(usize);

const RENDER_SCALE: f32 = 70.0;
const PARTICLE_SIZE: f32 = 6.0;
const SPEED_FOR_RED: f32 = 6.0;

fn main() {
    let layout = InitialLayout::grid(64, 64, 0.13, GVec2::new(-3.0, 0.3));
    let sph = match SPHState::new(layout) {
        Ok(sph) => sph,
        Err(e) => {
            eprintln!("cannot build initial layout: {e}");
            return;
        }
    };

    App::new()
        .add_plugins((DefaultPlugins, SphPlugin))
        .insert_resource(sph)
        .insert_resource(Colliders {
            boxes: vec![BoxCollider::rotated(
                GVec2::new(3.0, -2.5),
                GVec2::new(3.0, 0.6),
                0.4,
            )],
            circles: vec![CircleCollider {
                center: GVec2::new(5.5, 1.0),
                radius: 0.8,
            }],
        })
        .add_systems(Startup, setup)
        .add_systems(Update, (mouse_interaction, keyboard_control))
        .add_systems(
            Update,
            (count_steps, sync_particles).after(bevy_sph2d::plugin::advance_simulation),
        )
        .run();
}

fn speed_color(t: f32) -> Color {
    let t = t.clamp(0.0, 1.0);
    if t < 0.5 {
        let u = t * 2.0;
        Color::srgb(0.0, u, 1.0)
    } else if t < 0.75 {
        let u = (t - 0.5) / 0.25;
        Color::srgb(u, 1.0, 1.0 - u)
    } else {
        let u = (t - 0.75) / 0.25;
        Color::srgb(1.0, 1.0 - u, 0.0)
    }
}

fn mouse_interaction(
    mut input: ResMut<InteractionInput>,
    buttons: Res<ButtonInput<MouseButton>>,
    windows: Query<&Window, With<PrimaryWindow>>,
) {
    let Ok(window) = windows.single() else {
        return;
    };
    let Some(cursor) = window.cursor_position() else {
        input.strength_sign = 0.0;
        return;
    };

    let win_w = window.resolution.width();
    let win_h = window.resolution.height();
    input.point = GVec2::new(
        (cursor.x - win_w * 0.5) / RENDER_SCALE,
        (-cursor.y + win_h * 0.5) / RENDER_SCALE, // y downward is positive in bevy
    );
    input.strength_sign = if buttons.pressed(MouseButton::Left) {
        1.0
    } else if buttons.pressed(MouseButton::Right) {
        -1.0
    } else {
        0.0
    };
}

fn keyboard_control(keys: Res<ButtonInput<KeyCode>>, mut control: ResMut<SimControl>) {
    if keys.just_pressed(KeyCode::Space) {
        control.paused = !control.paused;
        info!("paused: {}", control.paused);
    }
    if keys.just_pressed(KeyCode::ArrowRight) && control.paused {
        control.step_once = true;
    }
    if keys.just_pressed(KeyCode::KeyR) {
        control.reset_requested = true;
    }
}

fn count_steps(mut events: EventReader<StepCompleted>, mut last: Local<u64>) {
    for ev in events.read() {
        if ev.step / 1000 > *last / 1000 {
            info!("{} steps", ev.step);
        }
        *last = ev.step;
    }
}

fn sync_particles(
    sph: Res<SPHState>,
    mut query: Query<(&ParticleVisual, &mut Transform, &mut Sprite)>,
) {
    let positions = sph.positions();
    let velocities = sph.velocities();

    for (visual, mut transform, mut sprite) in query.iter_mut() {
        let pos = positions[visual.0];
        transform.translation.x = pos.x * RENDER_SCALE;
        transform.translation.y = pos.y * RENDER_SCALE;
        sprite.color = speed_color(velocities[visual.0].length() / SPEED_FOR_RED);
    }
}

fn setup(mut commands: Commands, sph: Res<SPHState>, colliders: Res<Colliders>) {
    commands.spawn(Camera2d::default());

    for (i, p) in sph.positions().iter().enumerate() {
        commands.spawn((
            Sprite {
                color: Color::srgb(0.0, 1.0, 1.0),
                custom_size: Some(Vec2::splat(PARTICLE_SIZE)),
                ..Default::default()
            },
            Transform::from_translation(Vec3::new(p.x * RENDER_SCALE, p.y * RENDER_SCALE, 0.0)),
            ParticleVisual(i),
        ));
    }

    for b in &colliders.boxes {
        commands.spawn((
            Sprite {
                color: Color::srgb(0.4, 0.4, 0.4),
                custom_size: Some(Vec2::new(b.size.x, b.size.y) * RENDER_SCALE),
                ..Default::default()
            },
            Transform::from_translation(Vec3::new(
                b.center.x * RENDER_SCALE,
                b.center.y * RENDER_SCALE,
                -1.0,
            ))
            .with_rotation(Quat::from_rotation_z(b.forward.to_angle())),
        ));
    }
    // circles drawn as squares; the demo has no mesh pipeline
    for c in &colliders.circles {
        commands.spawn((
            Sprite {
                color: Color::srgb(0.4, 0.4, 0.4),
                custom_size: Some(Vec2::splat(c.radius * 2.0 * RENDER_SCALE)),
                ..Default::default()
            },
            Transform::from_translation(Vec3::new(
                c.center.x * RENDER_SCALE,
                c.center.y * RENDER_SCALE,
                -1.0,
            )),
        ));
    }
}
