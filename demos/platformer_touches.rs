use gridbonk::*;

fn main() -> Result<(), ColliderError> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("debug")).init();

    let mut world = CollisionWorld::new(WorldConfig {
        cell_size: 32.0,
        ..Default::default()
    })?;

    let floor = world.create_collider(0.0, 100.0, 400.0, 20.0)?;
    let wall = world.create_collider(150.0, 60.0, 20.0, 60.0)?;
    let coin = world.create_collider(60.0, 80.0, 8.0, 8.0)?;
    let player = world.create_collider(0.0, 0.0, 16.0, 16.0)?;

    if let Some(c) = world.collider_mut(floor) {
        c.set_collision_type(CollisionType::Solid);
    }
    if let Some(c) = world.collider_mut(wall) {
        c.set_collision_type(CollisionType::Solid);
    }
    if let Some(c) = world.collider_mut(coin) {
        c.set_collision_type(CollisionType::Sensor);
        c.set_response_name("coin");
    }
    if let Some(c) = world.collider_mut(player) {
        c.user_data = Some(1);
        c.set_collision_callback(|id, hit| {
            println!("{:?} hit {:?} normal=({}, {})", id, hit.other, hit.normal.x, hit.normal.y);
        });
    }
    world.step();

    // Fall onto the floor, then run right into the wall, then jump away.
    let moves = [(0.0, 200.0), (300.0, 82.0), (120.0, 82.0), (120.0, -50.0)];
    for (x, y) in moves {
        world.move_to(player, x, y)?;
        world.step();
        for ev in world.drain_events() {
            println!(
                "event {:?} vs {:?} toi={:.3} at ({:.1}, {:.1})",
                ev.a, ev.b, ev.sweep.toi, ev.sweep.position.x, ev.sweep.position.y
            );
        }
        if let Some(p) = world.collider(player) {
            let pos = p.position();
            println!("player at ({:.1}, {:.1}) touches {:?}", pos.x, pos.y, p.touches());
        }
    }

    println!("{:?}", world.debug_stats());
    Ok(())
}
