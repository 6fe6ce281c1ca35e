/*-------------------------------------------------------------------------------------------------
  Blocking Modules
-------------------------------------------------------------------------------------------------*/

mod http;

/*-------------------------------------------------------------------------------------------------
  Primary Interface
-------------------------------------------------------------------------------------------------*/

pub use http::HttpRemote;
