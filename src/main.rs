fn main() {
    if let Err(e) = soft_particles::core::Engine::run() {
        eprintln!("Engine failed to start: {}", e);
        std::process::exit(1);
    }
}
