//! RC4 stream cipher

/// RC4 key material
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Rc4Key {
    pub key: Vec<u8>,
}

impl Rc4Key {
    pub fn new(key: Vec<u8>) -> Self {
        Self { key }
    }

    pub fn from_slice(key: &[u8]) -> Self {
        Self { key: key.to_vec() }
    }
}

/// Keystream generator state
pub struct Rc4 {
    s: [u8; 256],
    i: u8,
    j: u8,
}

impl Rc4 {
    /// Run the key schedule. An empty key leaves the identity permutation.
    pub fn new(key: &Rc4Key) -> Self {
        let mut s = [0u8; 256];
        for (i, byte) in s.iter_mut().enumerate() {
            *byte = i as u8;
        }

        if !key.key.is_empty() {
            let mut j = 0u8;
            for i in 0..256 {
                j = j.wrapping_add(s[i]).wrapping_add(key.key[i % key.key.len()]);
                s.swap(i, usize::from(j));
            }
        }

        Self { s, i: 0, j: 0 }
    }

    fn next_byte(&mut self) -> u8 {
        self.i = self.i.wrapping_add(1);
        self.j = self.j.wrapping_add(self.s[usize::from(self.i)]);
        self.s.swap(usize::from(self.i), usize::from(self.j));
        let index = self.s[usize::from(self.i)].wrapping_add(self.s[usize::from(self.j)]);
        self.s[usize::from(index)]
    }

    /// XOR `data` with the keystream. Encryption and decryption are the same operation.
    pub fn process(&mut self, data: &[u8]) -> Vec<u8> {
        data.iter().map(|&byte| byte ^ self.next_byte()).collect()
    }

    pub fn process_in_place(&mut self, data: &mut [u8]) {
        for byte in data.iter_mut() {
            *byte ^= self.next_byte();
        }
    }
}

pub fn rc4_encrypt(key: &Rc4Key, data: &[u8]) -> Vec<u8> {
    Rc4::new(key).process(data)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rc4_roundtrip() {
        let key = Rc4Key::new(vec![0x01, 0x02, 0x03, 0x04, 0x05]);
        let plaintext = b"BT /F1 12 Tf (Hello) Tj ET";

        let ciphertext = rc4_encrypt(&key, plaintext);
        assert_ne!(ciphertext, plaintext);
        assert_eq!(rc4_encrypt(&key, &ciphertext), plaintext);
    }

    #[test]
    fn test_rc4_process_in_place() {
        let key = Rc4Key::from_slice(b"Key");
        let mut data = b"Plaintext".to_vec();

        Rc4::new(&key).process_in_place(&mut data);
        assert_eq!(data, vec![0xBB, 0xF3, 0x16, 0xE8, 0xD9, 0x40, 0xAF, 0x0A, 0xD3]);

        Rc4::new(&key).process_in_place(&mut data);
        assert_eq!(data, b"Plaintext");
    }

    #[test]
    fn test_rc4_known_vectors() {
        // RFC 6229, 40-bit key
        let key = Rc4Key::from_slice(&[0x01, 0x02, 0x03, 0x04, 0x05]);
        let keystream = Rc4::new(&key).process(&[0u8; 16]);
        let expected = [
            0xb2, 0x39, 0x63, 0x05, 0xf0, 0x3d, 0xc0, 0x27, 0xcc, 0xc3, 0x52, 0x4a, 0x0a, 0x11,
            0x18, 0xa8,
        ];
        assert_eq!(keystream, expected);
    }

    #[test]
    fn test_rc4_empty_input() {
        let key = Rc4Key::from_slice(b"k");
        assert!(rc4_encrypt(&key, &[]).is_empty());
    }
}
