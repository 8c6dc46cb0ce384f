//! NULL: the RPC program's connectivity probe. No arguments, no result,
//! no failure mode short of the connection itself being gone.

pub async fn null() {}
