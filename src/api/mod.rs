pub mod room_routes;
