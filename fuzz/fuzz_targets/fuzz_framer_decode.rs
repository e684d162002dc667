#![no_main]

use bleota::framer::DataPacket;
use libfuzzer_sys::fuzz_target;

// The device never trusts ring-buffer contents: arbitrary bytes arriving
// from a misbehaving or malicious peer must decode to `None` or to a
// `DataPacket` whose `encode()` round-trips, never panic.
fuzz_target!(|data: &[u8]| {
    if let Some(packet) = DataPacket::decode(data) {
        let re_encoded = packet.encode();
        let _ = DataPacket::decode(&re_encoded);
    }
});
