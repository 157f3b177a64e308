use game_rooms::api::room_routes;
use game_rooms::config::Config;
use game_rooms::logging;
use game_rooms::store::MemoryRoomStore;
use warp::Filter;

#[tokio::main]
async fn main() {
    let config = match Config::from_env() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("{}", e);
            std::process::exit(1);
        }
    };
    logging::init(config.log_format, "info");

    let store = MemoryRoomStore::new();
    let routes = room_routes::routes(store).with(warp::trace::request());

    let (ip, port) = config.bind_address();
    tracing::info!(
        host = %std::net::Ipv4Addr::from(ip),
        port,
        "Room store listening"
    );

    warp::serve(routes)
        .run(config.bind_address())
        .await;
}
