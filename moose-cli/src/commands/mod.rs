pub mod consumption_apis;
pub mod consumption_type_serializer;
pub mod dmv2_serializer;
pub mod export_serializer;
pub mod scripts;
pub mod streaming_functions;

pub type CommandResult = Result<(), String>;
