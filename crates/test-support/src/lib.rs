// test-support: shared UDP/TCP harness for the control protocol test suite.
//
// Provides a mock server (answers requests per a caller-supplied script) and
// a mock client (sends a request, waits for the matching-seqno reply) for
// integration testing of server_board and client_hub without spinning up
// the real dispatcher or transaction engine.

pub mod mock_udp_client;
pub mod mock_udp_server;

pub use mock_udp_client::MockUdpClient;
pub use mock_udp_server::MockUdpServer;
