use aes::cipher::generic_array::GenericArray;
use aes::cipher::{BlockEncrypt, KeyInit};
use aes::Aes128;

/// QUIC header protection: a single-block AES-ECB encryption of a 16-byte
/// sample taken from the packet's ciphertext, per RFC 9001 §5.4.
fn mask(hp_key: &[u8; 16], sample: &[u8; 16]) -> [u8; 16] {
    let cipher = Aes128::new(GenericArray::from_slice(hp_key));
    let mut block = *sample;
    let ga = GenericArray::from_mut_slice(&mut block);
    cipher.encrypt_block(ga);
    block
}

const LONG_HEADER_BIT: u8 = 0x80;

/// Applies header protection in place. `pn_offset` is the byte offset of
/// the packet-number field within `packet`; `pn_len` is 1..=4. Bounds
/// violations are a no-op rather than a panic or buffer corruption.
pub fn apply(hp_key: &[u8; 16], packet: &mut [u8], pn_offset: usize, pn_len: usize) {
    if packet.is_empty() || pn_len == 0 || pn_len > 4 {
        return;
    }
    let sample_offset = pn_offset + 4;
    if sample_offset + 16 > packet.len() || pn_offset + pn_len > packet.len() {
        return;
    }
    let mut sample = [0u8; 16];
    sample.copy_from_slice(&packet[sample_offset..sample_offset + 16]);
    let m = mask(hp_key, &sample);

    let is_long = packet[0] & LONG_HEADER_BIT != 0;
    if is_long {
        packet[0] ^= m[0] & 0x0F;
    } else {
        packet[0] ^= m[0] & 0x1F;
    }
    for i in 0..pn_len {
        packet[pn_offset + i] ^= m[1 + i];
    }
}

/// Header-protection removal is the same XOR mask applied a second time
/// (mask is self-inverse), but the packet-number length must be recovered
/// from the now-unmasked first byte's low bits before the caller knows how
/// many packet-number bytes to unmask — so this takes the length as
/// already-determined by the caller, matching `apply`'s contract.
pub fn remove(hp_key: &[u8; 16], packet: &mut [u8], pn_offset: usize, pn_len: usize) {
    apply(hp_key, packet, pn_offset, pn_len);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn apply_then_remove_restores_original_bytes() {
        let hp_key = [9u8; 16];
        let mut packet = vec![0x80u8; 64];
        packet[5] = 0x01;
        let original = packet.clone();
        apply(&hp_key, &mut packet, 1, 2);
        assert_ne!(packet, original);
        remove(&hp_key, &mut packet, 1, 2);
        assert_eq!(packet, original);
    }

    #[test]
    fn short_buffer_is_a_no_op() {
        let hp_key = [9u8; 16];
        let mut packet = vec![0x40u8; 4];
        let original = packet.clone();
        apply(&hp_key, &mut packet, 1, 2);
        assert_eq!(packet, original);
    }
}
