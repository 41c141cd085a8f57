//! Utility functions and helper types.

use futures::stream::{Stream, StreamExt};

use crate::core::error::Result;
use crate::core::traits::Products;

/// The unqualified name of a type, without module path or generic arguments.
///
/// `alloc::vec::Vec<i32>` becomes `Vec`, `my_crate::stages::Parse` becomes
/// `Parse`.
pub fn short_type_name<T: ?Sized>() -> String {
    let full = std::any::type_name::<T>();
    let base = full.split('<').next().unwrap_or(full);
    base.rsplit("::").next().unwrap_or(base).to_string()
}

/// Turn the outcome of one transformation into a flat item sequence.
pub(crate) fn expand<T: Send + 'static>(outcome: Result<Vec<T>>) -> Products<T> {
    match outcome {
        Ok(items) => Box::new(items.into_iter().map(Ok)),
        Err(e) => Box::new(std::iter::once(Err(e))),
    }
}

/// Drain a stream into a vector, stopping at the first error.
pub async fn try_stream_into_vec<S, T>(stream: S) -> Result<Vec<T>>
where
    S: Stream<Item = Result<T>>,
{
    let mut stream = std::pin::pin!(stream);
    let mut items = Vec::new();
    while let Some(item) = stream.next().await {
        items.push(item?);
    }
    Ok(items)
}

/// Drain a synchronous item sequence into a vector, stopping at the first
/// error.
pub fn try_collect<T>(products: Products<T>) -> Result<Vec<T>> {
    products.collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::error::Error;
    use futures::stream;

    struct Parse;

    #[test]
    fn test_short_type_name() {
        assert_eq!(short_type_name::<Parse>(), "Parse");
        assert_eq!(short_type_name::<Vec<i32>>(), "Vec");
        assert_eq!(short_type_name::<i64>(), "i64");
    }

    #[test]
    fn test_expand() {
        let ok: Vec<_> = expand(Ok(vec![1, 2])).collect();
        assert_eq!(ok.len(), 2);

        let failed: Vec<Result<i32>> = expand(Err(Error::custom("boom"))).collect();
        assert_eq!(failed.len(), 1);
        assert!(failed[0].is_err());
    }

    #[tokio::test]
    async fn test_try_stream_into_vec_stops_at_error() {
        let items = stream::iter(vec![Ok(1), Err(Error::custom("boom")), Ok(3)]);
        assert!(try_stream_into_vec(items).await.is_err());

        let items = stream::iter(vec![Ok::<_, Error>(1), Ok(2)]);
        assert_eq!(try_stream_into_vec(items).await.unwrap(), vec![1, 2]);
    }
}
