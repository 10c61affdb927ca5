//! Two sessions fed the same commands must stay bit-identical.

use backtrack_core::{Command, StepInput};
use backtrack_world::{query, World};

#[derive(Debug, PartialEq, Eq)]
struct Fingerprint {
    frame: u64,
    history_len: usize,
    player: (u32, u32, u32, u32),
    ghosts: Vec<(u32, u32, u32, bool, usize)>,
    door_open: bool,
}

fn fingerprint(world: &World) -> Fingerprint {
    let player = query::player(world);
    let ghosts = query::ghost_view(world)
        .iter()
        .map(|ghost| {
            (
                ghost.id.get(),
                ghost.position.x().to_bits(),
                ghost.position.y().to_bits(),
                ghost.active,
                ghost.replay_index,
            )
        })
        .collect();
    Fingerprint {
        frame: query::frame(world),
        history_len: query::history_len(world),
        player: (
            player.position.x().to_bits(),
            player.position.y().to_bits(),
            player.velocity.x().to_bits(),
            player.velocity.y().to_bits(),
        ),
        ghosts,
        door_open: query::door_open(world),
    }
}

fn scripted_commands() -> Vec<Command> {
    let mut commands = Vec::new();
    for frame in 0..300_u32 {
        commands.push(Command::Step {
            input: StepInput {
                left: frame % 13 == 0,
                right: frame % 2 == 0,
                jump: frame % 9 == 0,
            },
        });
        if frame % 60 == 59 {
            commands.push(Command::Rewind);
        }
    }
    commands
}

#[test]
fn identical_scripts_produce_bit_identical_sessions() {
    let mut first = World::new();
    let mut second = World::new();

    for (index, command) in scripted_commands().into_iter().enumerate() {
        let mut first_events = Vec::new();
        let mut second_events = Vec::new();
        backtrack_world::apply(&mut first, command.clone(), &mut first_events);
        backtrack_world::apply(&mut second, command, &mut second_events);

        assert_eq!(
            first_events, second_events,
            "event streams diverged at command {index}"
        );
        if index % 25 == 0 {
            assert_eq!(
                fingerprint(&first),
                fingerprint(&second),
                "state diverged at command {index}"
            );
        }
    }
    assert_eq!(fingerprint(&first), fingerprint(&second));
}
