//! The proto generated servers, clients, and messages for the EigenDA v2
//! disperser and retriever services.

// We don't have control over tonic generated code so we ignore the
// lints it complains about
#![allow(clippy::all, clippy::missing_const_for_fn, unreachable_pub)]

pub mod common {
    tonic::include_proto!("common");

    pub mod v2 {
        tonic::include_proto!("common.v2");
    }
}

pub mod disperser {
    pub mod v2 {
        tonic::include_proto!("disperser.v2");
    }
}

pub mod retriever {
    pub mod v2 {
        tonic::include_proto!("retriever.v2");
    }
}
