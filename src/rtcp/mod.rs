pub mod app;
pub mod bye;
pub mod common_header;
pub mod config;
pub mod generic_nack;
pub mod packet_type;
pub mod picture_loss;
pub mod receiver_report;
pub mod report_block;
pub mod rtcp;
pub mod rtcp_error;
pub mod sdes;
pub mod sender_info;
pub mod sender_report;

pub mod feedback {
    //! RFC 4585/5104 transport- and payload-specific feedback, kept as an
    //! explicit extension beyond the core SR/RR/SDES/BYE/APP compound packet.
    pub use super::generic_nack::GenericNack;
    pub use super::picture_loss::PictureLossIndication;
}

pub mod runner;

pub use common_header::CommonHeader;
pub use packet_type::RtcpPacketType;
pub use rtcp::RtcpPacket;
pub use rtcp_error::RtcpError;
