use bytes::BufMut;

use super::{
    decode::{decode_rlp_item, get_item_with_prefix, RLPDecode},
    encode::{encode_length, RLPEncode},
    error::RLPDecodeError,
};

/// # Struct decoding helper
///
/// Used to decode a struct from RLP format.
/// The struct's fields must implement [`RLPDecode`].
/// The struct is expected to be encoded as a list containing each of its fields in order.
///
/// # Examples
///
/// ```
/// # use hexary_rlp::structs::Decoder;
/// #[derive(Debug, PartialEq)]
/// struct Simple {
///     pub a: u8,
///     pub b: u16,
/// }
///
/// let encoded = [0xc2, 61, 75];
/// let decoder = Decoder::new(&encoded).unwrap();
/// let (a, decoder) = decoder.decode_field("a").unwrap();
/// let (b, decoder) = decoder.decode_field("b").unwrap();
/// decoder.finish().unwrap();
///
/// assert_eq!(Simple { a, b }, Simple { a: 61, b: 75 });
/// ```
#[derive(Debug)]
#[must_use = "`Decoder` must be consumed with `finish` to perform the decoding checks"]
pub struct Decoder<'a> {
    payload: &'a [u8],
    remaining: &'a [u8],
}

impl<'a> Decoder<'a> {
    pub fn new(buf: &'a [u8]) -> Result<Self, RLPDecodeError> {
        match decode_rlp_item(buf)? {
            (true, payload, remaining) => Ok(Self { payload, remaining }),
            (false, _, _) => Err(RLPDecodeError::UnexpectedString),
        }
    }

    pub fn decode_field<T: RLPDecode>(self, name: &str) -> Result<(T, Self), RLPDecodeError> {
        let (field, rest) = <T as RLPDecode>::decode_unfinished(self.payload)
            .map_err(|err| field_decode_error::<T>(name, err))?;
        let updated_self = Self {
            payload: rest,
            ..self
        };
        Ok((field, updated_self))
    }

    /// Returns the next field without decoding it, i.e. the payload bytes including its prefix.
    pub fn get_encoded_item(self) -> Result<(Vec<u8>, Self), RLPDecodeError> {
        let (field, rest) = get_item_with_prefix(self.payload)?;
        let updated_self = Self {
            payload: rest,
            ..self
        };
        Ok((field.to_vec(), updated_self))
    }

    /// Returns true if the decoder has consumed every field of the list.
    pub fn is_done(&self) -> bool {
        self.payload.is_empty()
    }

    /// Finishes the decoding and returns the remaining bytes after the list.
    /// Fails if the list was not fully consumed.
    pub fn finish(self) -> Result<&'a [u8], RLPDecodeError> {
        if self.payload.is_empty() {
            Ok(self.remaining)
        } else {
            Err(RLPDecodeError::MalformedData)
        }
    }
}

fn field_decode_error<T>(field_name: &str, err: RLPDecodeError) -> RLPDecodeError {
    let typ = std::any::type_name::<T>();
    let msg = format!("Error decoding field '{field_name}' of type {typ}: {err}");
    RLPDecodeError::Custom(msg)
}

/// # Struct encoding helper
///
/// Used to encode a struct to RLP format.
/// The struct is encoded as a list containing each of its fields in order.
/// Fields are buffered until [`finish`](Encoder::finish) computes the list
/// header and flushes everything into the output buffer.
///
/// # Examples
///
/// ```
/// # use hexary_rlp::structs::Encoder;
/// struct Simple {
///     pub a: u8,
///     pub b: u16,
/// }
///
/// let value = Simple { a: 61, b: 75 };
/// let mut buf = Vec::new();
/// Encoder::new(&mut buf)
///     .encode_field(&value.a)
///     .encode_field(&value.b)
///     .finish();
///
/// assert_eq!(buf, [0xc2, 61, 75]);
/// ```
#[must_use = "`Encoder` must be consumed with `finish` to write the encoding"]
pub struct Encoder<'a> {
    buf: &'a mut dyn BufMut,
    temp_buf: Vec<u8>,
}

impl<'a> Encoder<'a> {
    /// Creates a new [`Encoder`] that writes into `buf` on [`finish`](Encoder::finish).
    pub fn new(buf: &'a mut dyn BufMut) -> Self {
        Self {
            buf,
            temp_buf: Vec::new(),
        }
    }

    /// Encodes a field, appending it to the list's payload.
    pub fn encode_field<T: RLPEncode + ?Sized>(mut self, value: &T) -> Self {
        <T as RLPEncode>::encode(value, &mut self.temp_buf);
        self
    }

    /// Encodes a slice as an RLP byte string, appending it to the list's payload.
    pub fn encode_bytes(mut self, value: &[u8]) -> Self {
        <[u8] as RLPEncode>::encode(value, &mut self.temp_buf);
        self
    }

    /// Appends already-encoded bytes to the list's payload verbatim.
    pub fn encode_raw(mut self, value: &[u8]) -> Self {
        self.temp_buf.put_slice(value);
        self
    }

    /// Writes the list header followed by the accumulated payload into the output buffer.
    pub fn finish(self) {
        encode_length(self.temp_buf.len(), self.buf);
        self.buf.put_slice(&self.temp_buf);
    }
}

#[cfg(test)]
mod tests {
    use super::{Decoder, Encoder};
    use crate::encode::RLPEncode;

    #[derive(Debug, PartialEq)]
    struct Simple {
        pub a: u8,
        pub b: u16,
    }

    #[test]
    fn test_decoder_simple_struct() {
        let expected = Simple { a: 61, b: 75 };
        let mut buf = Vec::new();
        (expected.a, expected.b).encode(&mut buf);

        let decoder = Decoder::new(&buf).unwrap();
        let (a, decoder) = decoder.decode_field("a").unwrap();
        let (b, decoder) = decoder.decode_field("b").unwrap();
        let rest = decoder.finish().unwrap();

        assert!(rest.is_empty());
        assert_eq!(Simple { a, b }, expected);
    }

    #[test]
    fn test_encoder_simple_struct() {
        let value = Simple { a: 61, b: 75 };
        let mut buf = Vec::new();

        Encoder::new(&mut buf)
            .encode_field(&value.a)
            .encode_field(&value.b)
            .finish();

        assert_eq!(buf, vec![0xc2, 61, 75]);
    }

    #[test]
    fn test_encoder_raw_and_bytes() {
        // [ "dog", <raw 0xc0> ]
        let mut buf = Vec::new();
        Encoder::new(&mut buf)
            .encode_bytes(b"dog")
            .encode_raw(&[0xc0])
            .finish();

        assert_eq!(buf, vec![0xc5, 0x83, b'd', b'o', b'g', 0xc0]);
    }
}
