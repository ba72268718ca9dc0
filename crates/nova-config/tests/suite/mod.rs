mod diagnostics;
mod loading;
mod schema;
